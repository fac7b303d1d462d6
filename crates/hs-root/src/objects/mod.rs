//! ROOT object (de)serialization dispatch.

mod th1;

use crate::error::Result;
use crate::histogram::{RootHistogram, Th1Kind};

/// Read a histogram from a decompressed object payload, given its class name.
pub fn read_histogram(payload: &[u8], class_name: &str) -> Result<RootHistogram> {
    th1::read_th1(payload, Th1Kind::from_class_name(class_name)?)
}

/// Write a histogram as an object payload of class [`RootHistogram::kind`].
pub fn write_histogram(h: &RootHistogram) -> Vec<u8> {
    th1::write_th1(h)
}
