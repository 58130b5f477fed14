pub mod quality;
pub mod review_card;
pub mod review_session;
pub mod sm2;
pub mod vocab_item;

pub use quality::Quality;
pub use review_card::{HasDueDate, ReviewCard};
pub use review_session::ReviewSession;
pub use vocab_item::{VocabCard, VocabItem};
