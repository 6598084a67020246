mod expect;
mod send_eof;
mod send_line;
mod wait;

pub use expect::Expect;
pub use send_eof::SendEof;
pub use send_line::SendLine;
pub use wait::{OnMatch, Wait};
