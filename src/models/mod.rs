pub mod consumer;
pub mod interaction;

pub use consumer::Consumer;
pub use interaction::{Interaction, InteractionStatus};
