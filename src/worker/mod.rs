pub(crate) mod handle;
