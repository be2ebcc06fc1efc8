pub(crate) mod flatten;
pub(crate) mod layout;
pub(crate) mod model;
