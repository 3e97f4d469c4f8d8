/*!
 Errors that can happen when decoding and previewing property list data.
*/

pub mod bplist;
