//! Length-framed, tagged request/response wire codec.
//!
//! Rust port of `original_source/requests/Request.hpp`/`CmdRequest.hpp` and
//! `original_source/responses/Response.hpp` and its `NilResponse`/
//! `ErrResponse`/`IntResponse`/`StrResponse`/`ArrResponse`/`DblResponse`
//! subclasses. The C++ source models each response kind as a distinct class
//! under a common base; this crate collapses that into one tagged `enum`,
//! per `SPEC_FULL.md` §9 ("polymorphic responses ... modeled as a tagged
//! sum"). `marshal`/`unmarshal` replace the per-class virtual
//! `marshal`/`unmarshal` methods.

use crate::buffer::Buffer;
use crate::codec;
use crate::error::CodecError;

/// Maximum payload size (excluding the 4-byte length prefix) for a frame in
/// either direction.
pub const MAX_FRAME_LEN: usize = 4096;

const REQ_TAG_COMMAND: u8 = 0;

const RESP_TAG_NIL: u8 = 0;
const RESP_TAG_ERR: u8 = 1;
const RESP_TAG_STR: u8 = 2;
const RESP_TAG_INT: u8 = 3;
const RESP_TAG_ARR: u8 = 4;
const RESP_TAG_DBL: u8 = 5;

/// A client request: a command name followed by its arguments, all as raw
/// byte strings (the dispatcher in `crate::store` is responsible for any
/// further parsing, e.g. a score argument as text to be parsed as `f64`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub args: Vec<Vec<u8>>,
}

/// A server response. Mirrors the C++ response class hierarchy as a single
/// tagged enum (`SPEC_FULL.md` §9).
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Nil,
    Err { code: u8, message: Vec<u8> },
    Str(Vec<u8>),
    Int(i64),
    Arr(Vec<Response>),
    Dbl(f64),
}

/// Opaque/unknown command, reported by the dispatcher through `err`.
pub const ERR_UNKNOWN: u8 = 0;
/// An argument (typically a value or key) exceeded a size limit.
pub const ERR_TOO_BIG: u8 = 1;

/// Appends `req`'s marshaled frame (4-byte length prefix + tagged payload)
/// to `out`. Fails if the encoded payload would exceed [`MAX_FRAME_LEN`].
pub fn marshal_request(req: &Request, out: &mut Buffer) -> Result<(), CodecError> {
    let payload_len = request_encoded_len(req);
    if payload_len > MAX_FRAME_LEN {
        return Err(CodecError::TooBig {
            len: payload_len,
            max: MAX_FRAME_LEN,
        });
    }
    out.append_u32(payload_len as u32);
    out.append_u8(REQ_TAG_COMMAND);
    out.append_u32(req.args.len() as u32);
    for arg in &req.args {
        out.append_u32(arg.len() as u32);
        out.append(arg);
    }
    Ok(())
}

fn request_encoded_len(req: &Request) -> usize {
    let mut len = 1 + 4; // tag + ncmd
    for arg in &req.args {
        len += 4 + arg.len();
    }
    len
}

/// Reads a `u8` at `offset`, or `Malformed` if that runs past `payload`.
fn checked_u8(payload: &[u8], offset: usize) -> Result<u8, CodecError> {
    if offset + 1 > payload.len() {
        return Err(CodecError::Malformed);
    }
    Ok(codec::read_u8(payload, offset))
}

/// Reads a little-endian `u32` at `offset`, or `Malformed` if that runs past
/// `payload`.
fn checked_u32(payload: &[u8], offset: usize) -> Result<u32, CodecError> {
    if offset + 4 > payload.len() {
        return Err(CodecError::Malformed);
    }
    Ok(codec::read_u32(payload, offset))
}

/// Reads a little-endian `i64` at `offset`, or `Malformed` if that runs past
/// `payload`.
fn checked_i64(payload: &[u8], offset: usize) -> Result<i64, CodecError> {
    if offset + 8 > payload.len() {
        return Err(CodecError::Malformed);
    }
    Ok(codec::read_i64(payload, offset))
}

/// Reads a little-endian `f64` at `offset`, or `Malformed` if that runs past
/// `payload`.
fn checked_f64(payload: &[u8], offset: usize) -> Result<f64, CodecError> {
    if offset + 8 > payload.len() {
        return Err(CodecError::Malformed);
    }
    Ok(codec::read_f64(payload, offset))
}

/// Reads `len` raw bytes at `offset`, or `Malformed` if that runs past
/// `payload`. Never reads past the stated length, per `SPEC_FULL.md` §4.2.
fn checked_bytes(payload: &[u8], offset: usize, len: usize) -> Result<&[u8], CodecError> {
    let in_bounds = offset.checked_add(len).map_or(false, |end| end <= payload.len());
    if !in_bounds {
        return Err(CodecError::Malformed);
    }
    Ok(codec::read_bytes(payload, offset, len))
}

/// Attempts to decode one framed request from the front of `data`. Returns
/// `Ok(None)` if `data` does not yet hold a complete frame (more bytes are
/// needed), `Ok(Some((req, consumed)))` on success, or an error for a
/// malformed frame. `consumed` is always `4 + len`.
///
/// The outer `len` prefix only bounds the frame as a whole; every field
/// inside the payload (`ncmd`, each argument's `slen`) is itself attacker
/// controlled and is bounds-checked against what's left of the payload
/// rather than trusted, so a frame with a valid outer length but a bogus
/// inner length reports `Malformed` instead of panicking.
pub fn unmarshal_request(data: &[u8]) -> Result<Option<(Request, usize)>, CodecError> {
    if data.len() < 4 {
        return Ok(None);
    }
    let len = codec::read_u32(data, 0) as usize;
    if len > MAX_FRAME_LEN {
        return Err(CodecError::TooBig {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    if data.len() < 4 + len {
        return Ok(None);
    }

    let payload = &data[4..4 + len];
    let tag = checked_u8(payload, 0)?;
    if tag != REQ_TAG_COMMAND {
        return Err(CodecError::InvalidTag(tag));
    }

    let ncmd = checked_u32(payload, 1)? as usize;
    let mut offset = 5;
    let mut args = Vec::with_capacity(ncmd.min(payload.len()));
    for _ in 0..ncmd {
        let slen = checked_u32(payload, offset)? as usize;
        offset += 4;
        args.push(checked_bytes(payload, offset, slen)?.to_vec());
        offset += slen;
    }

    Ok(Some((Request { args }, 4 + len)))
}

/// Appends `resp`'s marshaled frame to `out`.
pub fn marshal_response(resp: &Response, out: &mut Buffer) -> Result<(), CodecError> {
    let payload_len = response_encoded_len(resp);
    if payload_len > MAX_FRAME_LEN {
        return Err(CodecError::TooBig {
            len: payload_len,
            max: MAX_FRAME_LEN,
        });
    }
    out.append_u32(payload_len as u32);
    write_response(resp, out);
    Ok(())
}

fn write_response(resp: &Response, out: &mut Buffer) {
    match resp {
        Response::Nil => out.append_u8(RESP_TAG_NIL),
        Response::Err { code, message } => {
            out.append_u8(RESP_TAG_ERR);
            out.append_u8(*code);
            // The message is a nested `str` response, per `SPEC_FULL.md` §4.10
            // and `original_source/responses/ErrResponse.cpp`'s `serialize`,
            // which delegates to a held `StrResponse`.
            out.append_u8(RESP_TAG_STR);
            out.append_u32(message.len() as u32);
            out.append(message);
        }
        Response::Str(bytes) => {
            out.append_u8(RESP_TAG_STR);
            out.append_u32(bytes.len() as u32);
            out.append(bytes);
        }
        Response::Int(value) => {
            out.append_u8(RESP_TAG_INT);
            out.append_i64(*value);
        }
        Response::Arr(elements) => {
            out.append_u8(RESP_TAG_ARR);
            out.append_u32(elements.len() as u32);
            for element in elements {
                write_response(element, out);
            }
        }
        Response::Dbl(value) => {
            out.append_u8(RESP_TAG_DBL);
            out.append_f64(*value);
        }
    }
}

fn response_encoded_len(resp: &Response) -> usize {
    match resp {
        Response::Nil => 1,
        Response::Err { message, .. } => 1 + 1 + 1 + 4 + message.len(),
        Response::Str(bytes) => 1 + 4 + bytes.len(),
        Response::Int(_) => 1 + 8,
        Response::Arr(elements) => 1 + 4 + elements.iter().map(response_encoded_len).sum::<usize>(),
        Response::Dbl(_) => 1 + 8,
    }
}

/// Attempts to decode one framed response from the front of `data`. Same
/// incomplete/error contract as [`unmarshal_request`].
pub fn unmarshal_response(data: &[u8]) -> Result<Option<(Response, usize)>, CodecError> {
    if data.len() < 4 {
        return Ok(None);
    }
    let len = codec::read_u32(data, 0) as usize;
    if len > MAX_FRAME_LEN {
        return Err(CodecError::TooBig {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    if data.len() < 4 + len {
        return Ok(None);
    }

    let payload = &data[4..4 + len];
    let (resp, used) = read_response(payload, 0)?;
    if used != len {
        return Err(CodecError::Malformed);
    }
    Ok(Some((resp, 4 + len)))
}

/// Decodes one tagged response value starting at `offset` within `payload`,
/// returning the value and how many bytes it occupied (recursing for
/// array elements, per `SPEC_FULL.md` §4.10).
///
/// Every length-prefixed field is bounds-checked against `payload` rather
/// than trusted, so malformed-but-length-valid frames report `Malformed`
/// instead of panicking on an out-of-range slice.
fn read_response(payload: &[u8], offset: usize) -> Result<(Response, usize), CodecError> {
    let tag = checked_u8(payload, offset)?;
    match tag {
        RESP_TAG_NIL => Ok((Response::Nil, 1)),
        RESP_TAG_ERR => {
            let code = checked_u8(payload, offset + 1)?;
            let nested_tag = checked_u8(payload, offset + 2)?;
            if nested_tag != RESP_TAG_STR {
                return Err(CodecError::InvalidTag(nested_tag));
            }
            let mlen = checked_u32(payload, offset + 3)? as usize;
            let message = checked_bytes(payload, offset + 7, mlen)?.to_vec();
            Ok((Response::Err { code, message }, 1 + 1 + 1 + 4 + mlen))
        }
        RESP_TAG_STR => {
            let slen = checked_u32(payload, offset + 1)? as usize;
            let bytes = checked_bytes(payload, offset + 5, slen)?.to_vec();
            Ok((Response::Str(bytes), 1 + 4 + slen))
        }
        RESP_TAG_INT => {
            let value = checked_i64(payload, offset + 1)?;
            Ok((Response::Int(value), 1 + 8))
        }
        RESP_TAG_ARR => {
            let n = checked_u32(payload, offset + 1)? as usize;
            let mut used = 1 + 4;
            let mut elements = Vec::with_capacity(n.min(payload.len()));
            for _ in 0..n {
                let (element, element_len) = read_response(payload, offset + used)?;
                elements.push(element);
                used += element_len;
            }
            Ok((Response::Arr(elements), used))
        }
        RESP_TAG_DBL => {
            let value = checked_f64(payload, offset + 1)?;
            Ok((Response::Dbl(value), 1 + 8))
        }
        other => Err(CodecError::InvalidTag(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_request(req: Request) -> Request {
        let mut buf = Buffer::new();
        marshal_request(&req, &mut buf).unwrap();
        let (decoded, consumed) = unmarshal_request(buf.data()).unwrap().unwrap();
        assert_eq!(consumed, buf.len());
        decoded
    }

    fn roundtrip_response(resp: Response) -> Response {
        let mut buf = Buffer::new();
        marshal_response(&resp, &mut buf).unwrap();
        let (decoded, consumed) = unmarshal_response(buf.data()).unwrap().unwrap();
        assert_eq!(consumed, buf.len());
        decoded
    }

    #[test]
    fn command_request_roundtrips_preserving_argument_order() {
        let req = Request {
            args: vec![b"set".to_vec(), b"k".to_vec(), b"v".to_vec()],
        };
        assert_eq!(roundtrip_request(req.clone()), req);
    }

    #[test]
    fn frame_length_matches_the_sum_of_its_parts() {
        let req = Request {
            args: vec![b"set".to_vec(), b"k".to_vec(), b"v".to_vec()],
        };
        let mut buf = Buffer::new();
        marshal_request(&req, &mut buf).unwrap();
        // 4 (len prefix) + 1 (tag) + 4 (ncmd) + (4+3) + (4+1) + (4+1)
        assert_eq!(buf.len(), 4 + 1 + 4 + (4 + 3) + (4 + 1) + (4 + 1));
    }

    #[test]
    fn nil_err_str_int_dbl_responses_all_roundtrip() {
        assert_eq!(roundtrip_response(Response::Nil), Response::Nil);
        assert_eq!(
            roundtrip_response(Response::Err {
                code: ERR_UNKNOWN,
                message: b"bad command".to_vec(),
            }),
            Response::Err {
                code: ERR_UNKNOWN,
                message: b"bad command".to_vec(),
            }
        );
        assert_eq!(
            roundtrip_response(Response::Str(b"value".to_vec())),
            Response::Str(b"value".to_vec())
        );
        assert_eq!(roundtrip_response(Response::Int(-42)), Response::Int(-42));
        assert_eq!(roundtrip_response(Response::Dbl(3.25)), Response::Dbl(3.25));
    }

    #[test]
    fn err_response_encodes_its_message_as_a_nested_str_response() {
        let mut buf = Buffer::new();
        marshal_response(
            &Response::Err {
                code: ERR_UNKNOWN,
                message: b"bad".to_vec(),
            },
            &mut buf,
        )
        .unwrap();
        let payload = &buf.data()[4..];
        assert_eq!(payload[0], RESP_TAG_ERR);
        assert_eq!(payload[1], ERR_UNKNOWN);
        assert_eq!(payload[2], RESP_TAG_STR);
        assert_eq!(&payload[3..7], &3u32.to_le_bytes());
        assert_eq!(&payload[7..10], b"bad");
    }

    #[test]
    fn an_err_response_with_a_non_str_nested_tag_is_an_invalid_tag() {
        let mut payload = vec![RESP_TAG_ERR, ERR_UNKNOWN, RESP_TAG_INT];
        payload.extend_from_slice(&0i64.to_le_bytes());
        let mut data = (payload.len() as u32).to_le_bytes().to_vec();
        data.extend_from_slice(&payload);
        assert_eq!(
            unmarshal_response(&data),
            Err(CodecError::InvalidTag(RESP_TAG_INT))
        );
    }

    #[test]
    fn nested_array_response_roundtrips() {
        let resp = Response::Arr(vec![
            Response::Str(b"a".to_vec()),
            Response::Dbl(1.0),
            Response::Arr(vec![Response::Int(1), Response::Int(2)]),
        ]);
        assert_eq!(roundtrip_response(resp.clone()), resp);
    }

    #[test]
    fn unmarshal_reports_incomplete_for_a_short_buffer() {
        assert_eq!(unmarshal_request(&[0, 0]), Ok(None));
        let mut buf = Buffer::new();
        marshal_request(
            &Request {
                args: vec![b"get".to_vec(), b"k".to_vec()],
            },
            &mut buf,
        )
        .unwrap();
        let truncated = &buf.data()[..buf.len() - 1];
        assert_eq!(unmarshal_request(truncated), Ok(None));
    }

    #[test]
    fn unmarshal_reports_too_big_past_the_frame_limit() {
        let data = (MAX_FRAME_LEN as u32 + 1).to_le_bytes();
        assert_eq!(
            unmarshal_request(&data),
            Err(CodecError::TooBig {
                len: MAX_FRAME_LEN + 1,
                max: MAX_FRAME_LEN,
            })
        );
    }

    #[test]
    fn unmarshal_at_exactly_max_frame_len_succeeds() {
        let mut payload = vec![REQ_TAG_COMMAND];
        payload.extend_from_slice(&0u32.to_le_bytes());
        payload.resize(MAX_FRAME_LEN, 0);
        let mut data = (MAX_FRAME_LEN as u32).to_le_bytes().to_vec();
        data.extend_from_slice(&payload);
        let (req, consumed) = unmarshal_request(&data).unwrap().unwrap();
        assert_eq!(consumed, 4 + MAX_FRAME_LEN);
        assert!(req.args.is_empty());
    }

    #[test]
    fn unmarshal_rejects_an_unrecognized_tag() {
        let mut data = 1u32.to_le_bytes().to_vec();
        data.push(0xFF);
        assert_eq!(unmarshal_request(&data), Err(CodecError::InvalidTag(0xFF)));
    }

    #[test]
    fn marshal_rejects_a_payload_over_the_frame_limit() {
        let req = Request {
            args: vec![vec![0u8; MAX_FRAME_LEN]],
        };
        let mut buf = Buffer::new();
        let result = marshal_request(&req, &mut buf);
        assert!(matches!(result, Err(CodecError::TooBig { .. })));
    }

    #[test]
    fn an_argument_length_claiming_more_than_the_payload_holds_is_malformed_not_a_panic() {
        // tag=0, ncmd=1, slen=huge, but no bytes follow.
        let mut payload = vec![REQ_TAG_COMMAND];
        payload.extend_from_slice(&1u32.to_le_bytes());
        payload.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        let mut data = (payload.len() as u32).to_le_bytes().to_vec();
        data.extend_from_slice(&payload);
        assert_eq!(unmarshal_request(&data), Err(CodecError::Malformed));
    }

    #[test]
    fn an_ncmd_count_past_the_payload_bound_is_malformed_not_a_panic() {
        // tag=0, ncmd claims 10 arguments, payload has none.
        let mut payload = vec![REQ_TAG_COMMAND];
        payload.extend_from_slice(&10u32.to_le_bytes());
        let mut data = (payload.len() as u32).to_le_bytes().to_vec();
        data.extend_from_slice(&payload);
        assert_eq!(unmarshal_request(&data), Err(CodecError::Malformed));
    }

    #[test]
    fn a_response_array_count_past_the_payload_bound_is_malformed_not_a_panic() {
        let mut payload = vec![RESP_TAG_ARR];
        payload.extend_from_slice(&5u32.to_le_bytes()); // claims 5 elements, none present
        let mut data = (payload.len() as u32).to_le_bytes().to_vec();
        data.extend_from_slice(&payload);
        assert_eq!(unmarshal_response(&data), Err(CodecError::Malformed));
    }

    #[test]
    fn a_response_whose_decoded_length_undershoots_the_frame_length_is_malformed() {
        // Frame claims a 10-byte payload, but a nil response only occupies 1.
        let mut data = 10u32.to_le_bytes().to_vec();
        data.push(RESP_TAG_NIL);
        data.resize(4 + 10, 0);
        assert_eq!(unmarshal_response(&data), Err(CodecError::Malformed));
    }
}
