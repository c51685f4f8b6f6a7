use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::invoke_signed;
use anchor_lang::solana_program::system_instruction;

/// Create-once and read helpers for `#[account]` types living at PDAs.
pub trait AccountExt: AccountSerialize + AccountDeserialize + Owner + Space + Sized {
    fn data_len() -> usize {
        8 + Self::INIT_SPACE
    }

    /// Creates `account` at its PDA and writes `self` into it. Fails with
    /// `ConstraintZero` when the account already holds data for the owning
    /// program, which makes `init` usable as an exactly-once marker. Lamports
    /// sent to the address beforehand are kept and topped up to rent exemption.
    fn init<'info>(
        self,
        account: &AccountInfo<'info>,
        payer: &AccountInfo<'info>,
        system_program: &Program<'info, System>,
        signer_seeds: &[&[&[u8]]],
    ) -> Result<()> {
        let program_id = Self::owner();
        let data_len = Self::data_len();
        let min_balance = Rent::get()?.minimum_balance(data_len);

        require!(
            account.data_is_empty() && *account.owner != program_id,
            anchor_lang::error::ErrorCode::ConstraintZero
        );

        let accounts = [
            payer.to_account_info(),
            account.to_account_info(),
            system_program.to_account_info(),
        ];

        if account.lamports() == 0 {
            invoke_signed(
                &system_instruction::create_account(
                    payer.key,
                    account.key,
                    min_balance,
                    data_len as u64,
                    &program_id,
                ),
                &accounts,
                signer_seeds,
            )?;
        } else {
            let top_up = min_balance.saturating_sub(account.lamports());
            if top_up > 0 {
                invoke_signed(
                    &system_instruction::transfer(payer.key, account.key, top_up),
                    &accounts,
                    signer_seeds,
                )?;
            }

            invoke_signed(
                &system_instruction::allocate(account.key, data_len as u64),
                &accounts[1..],
                signer_seeds,
            )?;
            invoke_signed(
                &system_instruction::assign(account.key, &program_id),
                &accounts[1..],
                signer_seeds,
            )?;
        }

        self.try_serialize(&mut &mut account.try_borrow_mut_data()?[..])
    }

    /// Reads the account when it has been created by the owning program.
    fn try_load(account: &AccountInfo) -> Result<Option<Self>> {
        if account.data_is_empty() || *account.owner != Self::owner() {
            return Ok(None);
        }

        Self::try_deserialize(&mut &account.try_borrow_data()?[..]).map(Some)
    }
}
