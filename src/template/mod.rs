pub(crate) mod classify;
pub(crate) mod entries;
pub(crate) mod render;
