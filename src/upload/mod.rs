//! Transient storage for uploaded audio
//!
//! Each request streams its blob into a uniquely named file under one shared
//! working directory. The `UploadedAudio` handle is the only owner of that
//! file and unlinks it on release or drop.

mod storage;

pub use storage::{TransientStorage, UploadedAudio};
