//! One idempotent handler per action kind.

mod click;
mod media;
mod navigate;
mod scroll;
mod search;
mod type_text;

pub(crate) use click::click;
pub(crate) use media::play_media;
pub(crate) use navigate::{history_back, history_forward, navigate};
pub(crate) use scroll::scroll;
pub(crate) use search::{search, site_search};
pub(crate) use type_text::type_text;
