//! Backend level results. Device implementations report driver failures with
//! `bail!`/`format_err!`; the video front converts them into typed errors.

pub type Result<T> = ::std::result::Result<T, ::failure::Error>;
