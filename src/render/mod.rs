pub(crate) mod backend;
pub(crate) mod cpu;
pub(crate) mod fingerprint;
pub(crate) mod pipeline;
