/*!
 This module defines the binary property list decoder and the utilities it relies on.
*/

pub mod bplist;
pub mod dates;
