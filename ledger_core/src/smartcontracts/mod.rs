//! Command execution (`§4.5`): the deterministic semantics of each
//! instruction in [`crate::data_model::transaction::Command`].

pub mod isi;

pub use isi::{CmdError, Execute};
