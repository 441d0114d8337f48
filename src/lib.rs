mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod pagination;
    pub mod schema;
    pub mod toggle;
}
mod session {
    pub mod jwt;
    pub mod middleware;
}
mod constants;
mod media;

pub use constants::*;
pub use database::*;
pub use media::*;
pub use session::*;
