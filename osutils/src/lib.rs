pub mod exe;
pub mod files;
pub mod shell;

pub(crate) mod crate_private {
    pub trait Sealed {}
}
