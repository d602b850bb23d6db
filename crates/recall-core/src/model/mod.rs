//! Plain data types shared by the scheduler, the stores, and the CLI.

pub mod post;
pub mod review;

pub use post::BlogPost;
pub use review::{PostReviewState, ReviewBox, ReviewHistory};
