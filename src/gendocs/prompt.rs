//! Interactive confirmation

use crate::gendocs::GendocsError;

/// Asks the user a yes/no question
pub trait Confirmer: Send + Sync {
    fn confirm(&self, message: &str) -> Result<bool, GendocsError>;
}

/// Terminal prompt via `inquire`
#[derive(Debug, Clone, Copy, Default)]
pub struct InquireConfirmer;

impl Confirmer for InquireConfirmer {
    fn confirm(&self, message: &str) -> Result<bool, GendocsError> {
        match inquire::Confirm::new(message).prompt() {
            Ok(answer) => Ok(answer),
            Err(inquire::InquireError::OperationCanceled)
            | Err(inquire::InquireError::OperationInterrupted) => Ok(false),
            Err(e) => Err(GendocsError::Prompt(e.to_string())),
        }
    }
}
