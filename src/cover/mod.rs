pub(crate) mod compose;
pub(crate) mod decode;
pub(crate) mod fit;
pub(crate) mod style;
pub(crate) mod typeset;
pub(crate) mod wrap;
