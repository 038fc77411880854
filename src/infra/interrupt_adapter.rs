use crate::app::CancelToken;

pub struct CtrlcInterruptor;

impl CtrlcInterruptor {
    /// Route Ctrl+C into `token`. Only one handler may be installed per process.
    ///
    /// # Errors
    /// Returns an error if a handler is already installed.
    pub fn install(token: &CancelToken) -> Result<(), ctrlc::Error> {
        let token = token.clone();
        ctrlc::set_handler(move || token.cancel())
    }
}
