pub(crate) mod helpers;
pub(crate) mod run;
pub(crate) mod sweep;
pub(crate) mod trace;
