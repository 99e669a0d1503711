//! Request body decoding, plain and whitelist-filtered.
//!
//! Both readers take the body by value, so it is released exactly once on
//! every exit path. An empty (or whitespace-only) body is a successful no-op.

use std::collections::HashMap;
use std::io::Read;

use serde::de::DeserializeOwned;
use serde_json::value::RawValue;

use crate::fields::{self, Extract};
use crate::types::{Error, ReadConfig, Result};

/// Body reader with a size limit.
#[derive(Debug, Clone, Default)]
pub struct BodyReader {
    config: ReadConfig,
}

impl BodyReader {
    pub fn new(config: ReadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReadConfig {
        &self.config
    }

    /// Decode the whole body into `dst`, replacing its value.
    pub fn read<R, T>(&self, body: R, dst: &mut T) -> Result<()>
    where
        R: Read,
        T: DeserializeOwned,
    {
        let bytes = self.collect(body)?;
        decode(&bytes, dst)
    }

    /// Decode only the whitelisted keys of the body into the matching fields
    /// of `dst`. See [`decode_filtered`].
    pub fn read_filtered<R, T, S>(&self, body: R, dst: &mut T, whitelist: &[S]) -> Result<()>
    where
        R: Read,
        T: Extract + ?Sized,
        S: AsRef<str>,
    {
        let bytes = self.collect(body)?;
        decode_filtered(&bytes, dst, whitelist)
    }

    fn collect<R: Read>(&self, body: R) -> Result<Vec<u8>> {
        let limit = self.config.max_body_bytes;
        let mut bytes = Vec::new();
        // `take` consumes the body; it is dropped at the end of this statement.
        body.take((limit as u64).saturating_add(1))
            .read_to_end(&mut bytes)?;

        if bytes.len() > limit {
            tracing::debug!("Rejecting request body larger than {} bytes", limit);
            return Err(Error::BodyTooLarge { limit });
        }
        Ok(bytes)
    }
}

/// Decode the whole body into `dst` using the default [`ReadConfig`].
pub fn read<R, T>(body: R, dst: &mut T) -> Result<()>
where
    R: Read,
    T: DeserializeOwned,
{
    BodyReader::default().read(body, dst)
}

/// Decode the whitelisted keys of the body into `dst` using the default
/// [`ReadConfig`].
pub fn read_filtered<R, T, S>(body: R, dst: &mut T, whitelist: &[S]) -> Result<()>
where
    R: Read,
    T: Extract + ?Sized,
    S: AsRef<str>,
{
    BodyReader::default().read_filtered(body, dst, whitelist)
}

/// Decode an already buffered body into `dst`, replacing its value.
pub fn decode<T: DeserializeOwned>(bytes: &[u8], dst: &mut T) -> Result<()> {
    if is_blank(bytes) {
        tracing::trace!("empty body, nothing to decode");
        return Ok(());
    }

    *dst = serde_json::from_slice(bytes).map_err(|err| {
        tracing::debug!("Failed to decode request body: {}", err);
        Error::decode(err)
    })?;
    Ok(())
}

/// Decode an already buffered body, assigning only whitelisted keys.
///
/// For every whitelisted name, in order, that is both a field of `dst` and a
/// key of the body, the key's value is deserialized into a fresh value of the
/// field's type and assigned. Names unknown to `dst` and names missing from
/// the body are skipped. Fields that are not whitelisted are never touched.
///
/// The first fragment that does not fit its field aborts the call with
/// [`Error::FieldDecode`]; fields assigned before it keep their new values.
pub fn decode_filtered<T, S>(bytes: &[u8], dst: &mut T, whitelist: &[S]) -> Result<()>
where
    T: Extract + ?Sized,
    S: AsRef<str>,
{
    let fragments = fragments(bytes)?;
    if fragments.is_empty() || whitelist.is_empty() {
        return Ok(());
    }

    let wanted = whitelist
        .iter()
        .map(|name| name.as_ref())
        .filter(|name| fragments.contains_key(*name));
    let mut fields = fields::extract_wanted(dst, wanted)?;

    for name in whitelist {
        let name = name.as_ref();
        let Some(slot) = fields.get_mut(name) else {
            tracing::debug!(field = name, "whitelisted field is not a field of the destination");
            continue;
        };
        let Some(fragment) = fragments.get(name).copied() else {
            tracing::trace!(field = name, "whitelisted field absent from body");
            continue;
        };

        slot.assign(fragment).map_err(|err| {
            tracing::debug!(field = name, "Failed to decode field: {}", err);
            Error::field_decode(name, err)
        })?;
        tracing::trace!(field = name, "assigned field");
    }

    Ok(())
}

/// Shallow decode of a JSON object into key -> unparsed value.
fn fragments(bytes: &[u8]) -> Result<HashMap<String, &RawValue>> {
    if is_blank(bytes) {
        tracing::trace!("empty body, nothing to decode");
        return Ok(HashMap::new());
    }

    serde_json::from_slice(bytes).map_err(|err| {
        tracing::debug!("Failed to decode request body: {}", err);
        Error::decode(err)
    })
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}
