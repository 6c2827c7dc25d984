//! HTTP status codes as a typed enum.
//!
//! Anything that takes a status accepts [`IntoStatus`], so both spellings work:
//!
//! ```rust
//! # fn demo(res: &mut routa::Response) -> Result<(), routa::Error> {
//! use routa::Status;
//!
//! res.status(Status::Created)?;
//! res.status(201)?;
//! # Ok(())
//! # }
//! ```

use crate::error::Error;

/// The status codes handlers reach for most often.
#[allow(clippy::enum_variant_names)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u16)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok                  = 200,
    Created             = 201,
    Accepted            = 202,
    NoContent           = 204,

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MovedPermanently    = 301,
    Found               = 302,
    SeeOther            = 303,
    NotModified         = 304,
    TemporaryRedirect   = 307,
    PermanentRedirect   = 308,

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest          = 400,
    Unauthorized        = 401,
    Forbidden           = 403,
    NotFound            = 404,
    MethodNotAllowed    = 405,
    Conflict            = 409,
    Gone                = 410,
    ContentTooLarge     = 413,
    UnsupportedMediaType = 415,
    UnprocessableContent = 422,
    TooManyRequests     = 429,

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError = 500,
    NotImplemented      = 501,
    BadGateway          = 502,
    ServiceUnavailable  = 503,
    GatewayTimeout      = 504,
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s as u16
    }
}

// ── IntoStatus ────────────────────────────────────────────────────────────────

/// Values accepted by [`Response::status`](crate::Response::status).
///
/// Implemented for [`Status`], `u16` and `i32`. The `i32` impl is what lets a
/// bare literal like `404` through. Codes outside `100..=999` are rejected
/// with [`Error::InvalidStatus`].
pub trait IntoStatus {
    fn into_status(self) -> Result<u16, Error>;
}

impl IntoStatus for Status {
    fn into_status(self) -> Result<u16, Error> {
        Ok(self.into())
    }
}

impl IntoStatus for u16 {
    fn into_status(self) -> Result<u16, Error> {
        if (100..=999).contains(&self) { Ok(self) } else { Err(Error::InvalidStatus(self.into())) }
    }
}

impl IntoStatus for i32 {
    fn into_status(self) -> Result<u16, Error> {
        u16::try_from(self)
            .map_err(|_| Error::InvalidStatus(self.into()))
            .and_then(IntoStatus::into_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_wire_code() {
        assert_eq!(u16::from(Status::Ok), 200);
        assert_eq!(u16::from(Status::NotFound), 404);
        assert_eq!(u16::from(Status::UnprocessableContent), 422);
    }

    #[test]
    fn integer_codes_are_range_checked() {
        assert_eq!(Status::NoContent.into_status().unwrap(), 204);
        assert_eq!(404_i32.into_status().unwrap(), 404);
        assert_eq!(418_u16.into_status().unwrap(), 418);
        assert!(matches!(99_i32.into_status(), Err(Error::InvalidStatus(99))));
        assert!(matches!(1000_u16.into_status(), Err(Error::InvalidStatus(1000))));
        assert!(matches!((-1_i32).into_status(), Err(Error::InvalidStatus(-1))));
        assert!(matches!(70_000_i32.into_status(), Err(Error::InvalidStatus(70_000))));
    }
}
