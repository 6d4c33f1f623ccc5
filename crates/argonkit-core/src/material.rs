//! Sensitive byte material with an explicit lifecycle.
//!
//! A [`SecureBytes`] converts one input (an owned byte buffer, a character
//! sequence, a byte stream or a text stream) into bytes on first use and keeps
//! the result until [`SecureBytes::clear`] wipes it. Reading after a clear is
//! allowed and yields the wiped (all-zero or empty) contents.
//!
//! ## Lifecycle
//!
//! - `materialize()` converts once and memoizes. Streams are read exactly once.
//! - `clear()` zeroes every buffer held internally and, for clearable-source
//!   kinds with `clear_source(true)`, the caller's original buffer as well.
//! - `scope()` returns a guard that clears on every exit path, including
//!   early returns and unwinding. This is the primary wiping mechanism.
//! - `finalizable()` arms a wipe when the value itself is dropped. It is an
//!   opt-in second line of defense, not a substitute for `scope()`/`clear()`.
//!
//! Materialization is not thread-safe: a source that has not been
//! materialized yet must not be shared across threads.
//!
//! ## Kinds
//!
//! The kind parameter restricts which adjustments are available:
//!
//! | Kind               | `encoding` / `normalize` | `clear_source` |
//! |--------------------|--------------------------|----------------|
//! | `Plain`            | no                       | no             |
//! | `CharSeq`          | yes                      | no             |
//! | `ClearableSource`  | no                       | yes            |
//! | `ClearableCharSeq` | yes                      | yes            |

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Read};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use once_cell::unsync::OnceCell;
use zeroize::{DefaultIsZeroes, Zeroize};

use crate::charset::{self, Charset, Normalization};
use crate::error::{Error, Result};

/// Default chunk size used when consuming streams.
pub const STREAM_BUFFER_SIZE: usize = 64;

mod sealed {
    pub trait Sealed {}
}

/// Marker for the kind of a [`SecureBytes`].
pub trait Kind: sealed::Sealed {}

/// Kinds built from character data; they accept encoding and normalization.
pub trait TextKind: Kind {}

/// Kinds that can also wipe the caller's original buffer.
pub trait ClearableKind: Kind {}

/// Bytes from an owned buffer or a byte stream.
#[derive(Debug)]
pub struct Plain;

/// Bytes converted from characters.
#[derive(Debug)]
pub struct CharSeq;

/// Bytes copied from a caller-owned byte buffer.
#[derive(Debug)]
pub struct ClearableSource;

/// Bytes converted from a caller-owned string.
#[derive(Debug)]
pub struct ClearableCharSeq;

impl sealed::Sealed for Plain {}
impl sealed::Sealed for CharSeq {}
impl sealed::Sealed for ClearableSource {}
impl sealed::Sealed for ClearableCharSeq {}

impl Kind for Plain {}
impl Kind for CharSeq {}
impl Kind for ClearableSource {}
impl Kind for ClearableCharSeq {}

impl TextKind for CharSeq {}
impl TextKind for ClearableCharSeq {}

impl ClearableKind for ClearableSource {}
impl ClearableKind for ClearableCharSeq {}

/// Material converted from characters.
pub type CharSeqBytes<'a> = SecureBytes<'a, CharSeq>;

/// Material copied from a caller-owned byte buffer.
pub type ClearableBytes<'a> = SecureBytes<'a, ClearableSource>;

/// Material converted from a caller-owned string.
pub type ClearableCharSeqBytes<'a> = SecureBytes<'a, ClearableCharSeq>;

/// Sensitive byte material with deterministic wiping.
pub struct SecureBytes<'a, K: Kind = Plain> {
    data: Data<'a>,
    source: Option<Source<'a>>,
    clear_source: bool,
    cleared: bool,
    finalizable: bool,
    _kind: PhantomData<K>,
}

/// Caller-owned original buffer of a clearable source.
enum Source<'a> {
    Bytes(&'a mut [u8]),
    Text(&'a mut String),
}

impl Source<'_> {
    fn wipe(&mut self) {
        match self {
            Source::Bytes(bytes) => bytes.zeroize(),
            Source::Text(text) => {
                // Refill in place so the caller's buffer keeps its length as NULs.
                let len = text.len();
                text.zeroize();
                text.extend(std::iter::repeat('\0').take(len));
            }
        }
    }
}

enum Data<'a> {
    Bytes(Vec<u8>),
    Stream {
        stream: Stream<'a>,
        bytes: OnceCell<Vec<u8>>,
    },
    Text(TextData<'a>),
}

impl Data<'_> {
    fn bytes(&self) -> Result<&[u8]> {
        match self {
            Data::Bytes(bytes) => Ok(bytes),
            Data::Stream { stream, bytes } => bytes
                .get_or_try_init(|| stream.consume())
                .map(Vec::as_slice),
            Data::Text(text) => text.bytes(),
        }
    }

    fn wipe(&mut self) {
        match self {
            Data::Bytes(bytes) => bytes.as_mut_slice().zeroize(),
            Data::Stream { stream, bytes } => {
                stream.discard();
                wipe_or_seal(bytes);
            }
            Data::Text(text) => text.wipe(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Data::Bytes(_) => "bytes",
            Data::Stream { .. } => "byte stream",
            Data::Text(TextData {
                chars: Chars::Owned(_),
                ..
            }) => "char sequence",
            Data::Text(_) => "text stream",
        }
    }
}

/// Zero a memoized buffer in place, or pin an empty result if nothing was
/// materialized so later reads do not touch the original input.
fn wipe_or_seal<T: DefaultIsZeroes>(cell: &mut OnceCell<Vec<T>>) {
    match cell.get_mut() {
        Some(values) => values.as_mut_slice().zeroize(),
        None => {
            let _ = cell.set(Vec::new());
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Conversion {
    charset: Charset,
    normalization: Option<Normalization>,
}

struct TextData<'a> {
    chars: Chars<'a>,
    conversion: Conversion,
    bytes: OnceCell<Vec<u8>>,
}

enum Chars<'a> {
    Owned(Vec<char>),
    Stream {
        stream: Stream<'a>,
        chars: OnceCell<Vec<char>>,
    },
}

impl<'a> TextData<'a> {
    fn new(chars: Chars<'a>) -> Self {
        Self {
            chars,
            conversion: Conversion {
                charset: Charset::default(),
                normalization: None,
            },
            bytes: OnceCell::new(),
        }
    }

    fn chars(&self) -> Result<&[char]> {
        match &self.chars {
            Chars::Owned(chars) => Ok(chars),
            Chars::Stream { stream, chars } => chars
                .get_or_try_init(|| {
                    let mut raw = stream.consume()?;
                    let decoded = charset::decode_utf8_lossy(&raw);
                    raw.zeroize();
                    Ok(decoded)
                })
                .map(Vec::as_slice),
        }
    }

    fn bytes(&self) -> Result<&[u8]> {
        self.bytes
            .get_or_try_init(|| {
                charset::to_bytes(
                    self.chars()?,
                    self.conversion.charset,
                    self.conversion.normalization,
                )
            })
            .map(Vec::as_slice)
    }

    fn reconfigure(&mut self, conversion: Conversion) {
        if let Some(mut bytes) = self.bytes.take() {
            bytes.zeroize();
        }
        self.conversion = conversion;
    }

    fn wipe(&mut self) {
        match &mut self.chars {
            Chars::Owned(chars) => chars.as_mut_slice().zeroize(),
            Chars::Stream { stream, chars } => {
                stream.discard();
                wipe_or_seal(chars);
            }
        }
        if let Some(bytes) = self.bytes.get_mut() {
            bytes.as_mut_slice().zeroize();
        }
    }
}

struct Stream<'a> {
    reader: RefCell<Option<Box<dyn Read + 'a>>>,
    chunk_size: usize,
}

impl<'a> Stream<'a> {
    fn new(reader: impl Read + 'a, chunk_size: usize) -> Self {
        Self {
            reader: RefCell::new(Some(Box::new(reader))),
            chunk_size: chunk_size.max(1),
        }
    }

    fn consume(&self) -> Result<Vec<u8>> {
        let mut reader = self.reader.borrow_mut().take().ok_or_else(|| Error::Consumption {
            message: "Stream was already consumed by a failed read".to_string(),
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "stream unavailable"),
        })?;
        let bytes =
            read_chunked(&mut *reader, self.chunk_size).map_err(|source| Error::Consumption {
                message: "Could not consume stream".to_string(),
                source,
            })?;
        tracing::trace!("consumed stream");
        Ok(bytes)
    }

    fn discard(&mut self) {
        self.reader.get_mut().take();
    }
}

/// Read a stream to its end, growing the backing buffer one chunk at a time.
///
/// Every superseded buffer is wiped before it is released, so at most one
/// stale copy exists at any moment and the result has no spare capacity.
fn read_chunked<R: Read + ?Sized>(reader: &mut R, chunk: usize) -> io::Result<Vec<u8>> {
    let mut data = vec![0u8; chunk];
    let mut offset = 0;
    let mut total = 0;
    loop {
        let read = match fill(reader, &mut data[offset..offset + chunk]) {
            Ok(read) => read,
            Err(err) => {
                data.zeroize();
                return Err(err);
            }
        };
        total += read;
        data = if read < chunk {
            copy_and_wipe(data, total)
        } else {
            offset += chunk;
            let grown = data.len() + chunk;
            copy_and_wipe(data, grown)
        };
        if data.len() == total {
            return Ok(data);
        }
    }
}

/// Fill `buf` unless the stream ends first; returns the bytes read.
fn fill<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

fn copy_and_wipe(mut data: Vec<u8>, len: usize) -> Vec<u8> {
    let mut copy = vec![0u8; len];
    let keep = len.min(data.len());
    copy[..keep].copy_from_slice(&data[..keep]);
    data.zeroize();
    copy
}

impl<'a, K: Kind> SecureBytes<'a, K> {
    fn from_data(data: Data<'a>, source: Option<Source<'a>>) -> Self {
        Self {
            data,
            source,
            clear_source: false,
            cleared: false,
            finalizable: false,
            _kind: PhantomData,
        }
    }

    /// Convert the input to bytes, memoizing the result.
    ///
    /// After [`clear`](Self::clear) this returns the wiped contents.
    ///
    /// # Errors
    ///
    /// - `Error::Consumption` if reading the stream fails
    /// - `Error::Encoding` if character conversion fails
    pub fn materialize(&self) -> Result<&[u8]> {
        self.data.bytes()
    }

    /// Wipe every buffer held by this value.
    ///
    /// Idempotent: a second call leaves the contents exactly as the first did.
    pub fn clear(&mut self) {
        if self.clear_source {
            if let Some(source) = self.source.as_mut() {
                source.wipe();
            }
        }
        if !self.cleared {
            self.data.wipe();
            self.cleared = true;
        }
    }

    /// Whether [`clear`](Self::clear) has run.
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Arm a wipe when this value is dropped.
    #[must_use]
    pub fn finalizable(mut self) -> Self {
        self.finalizable = true;
        self
    }

    /// Guard that clears this value when it goes out of scope.
    ///
    /// # Examples
    ///
    /// ```
    /// use argonkit_core::material::ClearableBytes;
    ///
    /// let mut original = b"secret".to_vec();
    /// {
    ///     let material = ClearableBytes::from_slice(&mut original)
    ///         .clear_source(true)
    ///         .scope();
    ///     assert_eq!(material.materialize().unwrap(), b"secret");
    /// }
    /// assert_eq!(original, vec![0u8; 6]);
    /// ```
    pub fn scope(self) -> Scoped<'a, K> {
        Scoped { inner: self }
    }
}

impl<'a> SecureBytes<'a, Plain> {
    /// Take ownership of a byte buffer.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self::from_data(Data::Bytes(bytes), None)
    }

    /// Consume a byte stream in chunks of [`STREAM_BUFFER_SIZE`] on first use.
    pub fn from_reader(reader: impl Read + 'a) -> Self {
        Self::from_reader_with_buffer(reader, STREAM_BUFFER_SIZE)
    }

    /// Consume a byte stream in chunks of `buffer_size` on first use.
    pub fn from_reader_with_buffer(reader: impl Read + 'a, buffer_size: usize) -> Self {
        Self::from_data(
            Data::Stream {
                stream: Stream::new(reader, buffer_size),
                bytes: OnceCell::new(),
            },
            None,
        )
    }
}

impl<'a> SecureBytes<'a, CharSeq> {
    /// Copy the characters of `value`; converted with UTF-8 unless changed.
    pub fn from_text(value: &str) -> Self {
        Self::from_data(
            Data::Text(TextData::new(Chars::Owned(value.chars().collect()))),
            None,
        )
    }

    /// Consume a UTF-8 text stream in chunks of [`STREAM_BUFFER_SIZE`].
    ///
    /// Invalid UTF-8 sequences decode to U+FFFD.
    pub fn from_text_reader(reader: impl Read + 'a) -> Self {
        Self::from_text_reader_with_buffer(reader, STREAM_BUFFER_SIZE)
    }

    /// Consume a UTF-8 text stream in chunks of `buffer_size`.
    pub fn from_text_reader_with_buffer(reader: impl Read + 'a, buffer_size: usize) -> Self {
        Self::from_data(
            Data::Text(TextData::new(Chars::Stream {
                stream: Stream::new(reader, buffer_size),
                chars: OnceCell::new(),
            })),
            None,
        )
    }
}

impl<'a> SecureBytes<'a, ClearableSource> {
    /// Copy `value`, keeping a handle so `clear_source(true)` can wipe it.
    pub fn from_slice(value: &'a mut [u8]) -> Self {
        let copy = value.to_vec();
        Self::from_data(Data::Bytes(copy), Some(Source::Bytes(value)))
    }
}

impl<'a> SecureBytes<'a, ClearableCharSeq> {
    /// Copy the characters of `value`, keeping a handle so
    /// `clear_source(true)` can wipe it.
    pub fn from_string(value: &'a mut String) -> Self {
        let chars = value.chars().collect();
        Self::from_data(
            Data::Text(TextData::new(Chars::Owned(chars))),
            Some(Source::Text(value)),
        )
    }
}

impl<'a, K: TextKind> SecureBytes<'a, K> {
    /// Convert characters with `charset`.
    ///
    /// Bytes materialized under the previous settings are wiped.
    #[must_use]
    pub fn encoding(self, charset: Charset) -> Self {
        self.reconfigure(|conversion| conversion.charset = charset)
    }

    /// Convert characters with the charset named by `label`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Encoding` if the charset is not supported.
    pub fn encoding_named(self, label: &str) -> Result<Self> {
        let charset = label.parse::<Charset>()?;
        Ok(self.encoding(charset))
    }

    /// Normalize characters to NFC before conversion.
    #[must_use]
    pub fn normalize(self) -> Self {
        self.normalize_with(Normalization::default())
    }

    /// Normalize characters to `form` before conversion.
    #[must_use]
    pub fn normalize_with(self, form: Normalization) -> Self {
        self.reconfigure(|conversion| conversion.normalization = Some(form))
    }

    fn reconfigure(mut self, change: impl FnOnce(&mut Conversion)) -> Self {
        if let Data::Text(text) = &mut self.data {
            let mut conversion = text.conversion;
            change(&mut conversion);
            text.reconfigure(conversion);
        }
        self
    }
}

impl<K: ClearableKind> SecureBytes<'_, K> {
    /// Also wipe the caller's original buffer on [`clear`](Self::clear).
    #[must_use]
    pub fn clear_source(mut self, clear: bool) -> Self {
        self.clear_source = clear;
        self
    }
}

impl<K: Kind> Drop for SecureBytes<'_, K> {
    fn drop(&mut self) {
        if self.finalizable {
            self.clear();
        }
    }
}

impl<K: Kind> fmt::Debug for SecureBytes<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("SecureBytes");
        debug.field("source", &self.data.describe());
        if let Data::Text(text) = &self.data {
            debug
                .field("charset", &text.conversion.charset)
                .field("normalization", &text.conversion.normalization);
        }
        debug
            .field("cleared", &self.cleared)
            .field("finalizable", &self.finalizable)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Scope guard returned by [`SecureBytes::scope`].
///
/// Dereferences to the wrapped material and clears it when dropped.
pub struct Scoped<'a, K: Kind> {
    inner: SecureBytes<'a, K>,
}

impl<'a, K: Kind> Deref for Scoped<'a, K> {
    type Target = SecureBytes<'a, K>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<K: Kind> DerefMut for Scoped<'_, K> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<K: Kind> Drop for Scoped<'_, K> {
    fn drop(&mut self) {
        self.inner.clear();
    }
}

impl<K: Kind> fmt::Debug for Scoped<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Scoped").field(&self.inner).finish()
    }
}

/// Anything a builder can copy sensitive bytes from.
pub trait ByteMaterial {
    /// The bytes to copy.
    ///
    /// # Errors
    ///
    /// Materialization errors of [`SecureBytes`] are propagated.
    fn material(&self) -> Result<&[u8]>;
}

impl ByteMaterial for [u8] {
    fn material(&self) -> Result<&[u8]> {
        Ok(self)
    }
}

impl<const N: usize> ByteMaterial for [u8; N] {
    fn material(&self) -> Result<&[u8]> {
        Ok(self)
    }
}

impl ByteMaterial for Vec<u8> {
    fn material(&self) -> Result<&[u8]> {
        Ok(self)
    }
}

impl ByteMaterial for str {
    fn material(&self) -> Result<&[u8]> {
        Ok(self.as_bytes())
    }
}

impl ByteMaterial for String {
    fn material(&self) -> Result<&[u8]> {
        Ok(self.as_bytes())
    }
}

impl<K: Kind> ByteMaterial for SecureBytes<'_, K> {
    fn material(&self) -> Result<&[u8]> {
        self.materialize()
    }
}

impl<K: Kind> ByteMaterial for Scoped<'_, K> {
    fn material(&self) -> Result<&[u8]> {
        self.inner.materialize()
    }
}
