extern crate self as mobywatel_form;

pub mod form;
pub mod forms;
pub mod i18n;
pub mod prelude;

pub use i18n::{I18nManager, Locale};
