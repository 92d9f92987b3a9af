pub mod api;
pub mod error;
pub mod market;
pub mod transport;

pub mod util {
    pub mod env;
}
