#![forbid(unsafe_code)]

mod assemble;
mod frame;

pub use frame::{
    END_MARKER, Op, REQUEST_HEADER_LEN, RESPONSE_HEADER_LEN, Request, Response, Status,
};
