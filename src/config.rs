use std::os::raw::c_void;

pub(crate) type ScwsHandle = *mut c_void;
