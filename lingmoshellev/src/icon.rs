//! Window icons and the pipe based icon transfer of `org_kde_lingmo_window.get_icon`.
//!
//! The compositor writes the serialized icon into the write end of a pipe. The
//! read end is drained on a worker thread and the decoded result is sent back
//! to the event loop over a [`calloop::channel`], tagged with the window and
//! the fetch generation it belongs to.

use std::io::Read;
use std::os::fd::AsFd;
use std::path::PathBuf;
use std::thread;

use calloop::channel::Sender;
use freedesktop_icons::lookup;
use log::{debug, warn};

use crate::window::{WindowHandle, WindowId};

pub const DEFAULT_FALLBACK_ICON: &str = "wayland";

pub(crate) const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconFormat {
    Png,
    Svg,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub format: IconFormat,
    /// read from the png header, not known for svg
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WindowIcon {
    #[default]
    None,
    /// freedesktop icon theme name
    Themed(String),
    Image(IconImage),
}

impl WindowIcon {
    pub fn is_none(&self) -> bool {
        matches!(self, WindowIcon::None)
    }

    pub fn themed_name(&self) -> Option<&str> {
        match self {
            WindowIcon::Themed(name) => Some(name),
            _ => None,
        }
    }

    /// Resolve a themed icon in the current icon theme
    pub fn themed_path(&self, size: u16) -> Option<PathBuf> {
        let name = self.themed_name()?;
        lookup(name).with_size(size).with_cache().find()
    }
}

/// Sniff a serialized icon. Returns `None` for empty or unrecognised data.
pub fn decode_icon(bytes: &[u8]) -> Option<IconImage> {
    if bytes.is_empty() {
        return None;
    }
    if bytes.starts_with(PNG_SIGNATURE) {
        // IHDR is always the first chunk: length, tag, width, height
        let header = bytes.get(8..24)?;
        if &header[4..8] != b"IHDR" {
            return None;
        }
        let width = u32::from_be_bytes([header[8], header[9], header[10], header[11]]);
        let height = u32::from_be_bytes([header[12], header[13], header[14], header[15]]);
        return Some(IconImage {
            format: IconFormat::Png,
            width: Some(width),
            height: Some(height),
            data: bytes.to_vec(),
        });
    }
    let text = std::str::from_utf8(bytes).ok()?;
    let text = text.trim_start_matches('\u{feff}').trim_start();
    if text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg")) {
        return Some(IconImage {
            format: IconFormat::Svg,
            width: None,
            height: None,
            data: bytes.to_vec(),
        });
    }
    None
}

/// Key of the engine that serializes a list of pixmaps
const PIXMAP_ENGINE: &str = "QPixmapIconEngine";
/// Engines that serialize only a theme icon name
const THEMED_ENGINES: [&str; 2] = ["KIconEngine", "QIconLoaderEngine"];

/// Decode the payload written by the compositor: either a bare png/svg or a
/// `QDataStream` serialized `QIcon`. Unusable data yields [`WindowIcon::None`].
pub fn decode_icon_stream(bytes: &[u8]) -> WindowIcon {
    if let Some(image) = decode_icon(bytes) {
        return WindowIcon::Image(image);
    }
    decode_qicon(bytes).unwrap_or_default()
}

/// `QIcon` stream layout: the engine key as a `QString`, then engine data.
/// A pixmap engine writes an `i32` entry count and per entry a `QImage`
/// (`i32` null flag, then a png), the file name, the size as two `i32` and
/// mode and state as `u32`.
fn decode_qicon(bytes: &[u8]) -> Option<WindowIcon> {
    let mut stream = DataStream::new(bytes);
    let key = stream.string()?;
    match key.as_str() {
        PIXMAP_ENGINE => {
            let count = stream.i32()?;
            let mut largest: Option<IconImage> = None;
            for _ in 0..count {
                let image = match stream.i32()? {
                    0 => None,
                    _ => Some(stream.png().and_then(decode_icon)?),
                };
                if let Some(image) = image {
                    if area(&image) > largest.as_ref().map_or(0, area) {
                        largest = Some(image);
                    }
                }
                if stream.string().is_none() || stream.take(16).is_none() {
                    break;
                }
            }
            largest.map(WindowIcon::Image)
        }
        key if THEMED_ENGINES.contains(&key) => {
            let name = stream.string()?;
            (!name.is_empty()).then_some(WindowIcon::Themed(name))
        }
        other => {
            debug!("unsupported icon engine {other:?}");
            None
        }
    }
}

fn area(image: &IconImage) -> u64 {
    u64::from(image.width.unwrap_or(0)) * u64::from(image.height.unwrap_or(0))
}

/// Big endian reader over `QDataStream` data
struct DataStream<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DataStream<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn u32(&mut self) -> Option<u32> {
        let b = self.take(4)?;
        Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32(&mut self) -> Option<i32> {
        self.u32().map(|value| value as i32)
    }

    /// UTF-16 with a byte length prefix; a null string reads as empty
    fn string(&mut self) -> Option<String> {
        let len = self.u32()?;
        if len == u32::MAX {
            return Some(String::new());
        }
        let raw = self.take(len as usize)?;
        if raw.len() % 2 != 0 {
            return None;
        }
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|unit| u16::from_be_bytes([unit[0], unit[1]]))
            .collect();
        String::from_utf16(&units).ok()
    }

    /// An embedded png has no length prefix and runs through its IEND chunk
    fn png(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;
        if self.take(PNG_SIGNATURE.len())? != PNG_SIGNATURE {
            return None;
        }
        loop {
            let len = self.u32()? as usize;
            let tag = self.take(4)?;
            // chunk data and crc
            self.take(len.checked_add(4)?)?;
            if tag == b"IEND" {
                break;
            }
        }
        self.bytes.get(start..self.pos)
    }
}

/// Result of one icon transfer, applied on the event loop thread
#[derive(Debug)]
pub struct IconReply {
    pub window: WindowId,
    pub generation: u64,
    /// [`WindowIcon::None`] when nothing usable arrived
    pub icon: WindowIcon,
}

#[derive(Debug)]
pub struct IconFetcher {
    sender: Option<Sender<IconReply>>,
    fallback: String,
}

impl IconFetcher {
    pub fn new(sender: Option<Sender<IconReply>>, fallback: impl Into<String>) -> Self {
        Self {
            sender,
            fallback: fallback.into(),
        }
    }

    pub fn fallback_icon(&self) -> WindowIcon {
        WindowIcon::Themed(self.fallback.clone())
    }

    /// Ask `handle` to write its icon into a fresh pipe and read it on a worker.
    ///
    /// An error means no transfer is in flight and the caller should apply the
    /// fallback icon itself.
    pub fn fetch<H: WindowHandle>(
        &self,
        handle: &H,
        window: WindowId,
        generation: u64,
    ) -> std::io::Result<()> {
        let Some(sender) = self.sender.clone() else {
            return Err(std::io::Error::other("no icon reply channel"));
        };
        let (reader, writer) = std::io::pipe()?;
        handle.get_icon(writer.as_fd());
        // the compositor holds its own copy now
        drop(writer);
        thread::Builder::new()
            .name("lingmo-icon".to_owned())
            .spawn(move || {
                let icon = read_icon(reader);
                if sender
                    .send(IconReply {
                        window,
                        generation,
                        icon,
                    })
                    .is_err()
                {
                    debug!("event loop gone before the icon arrived");
                }
            })?;
        Ok(())
    }
}

pub(crate) fn read_icon<R: Read>(mut reader: R) -> WindowIcon {
    let mut data = Vec::new();
    if let Err(err) = reader.read_to_end(&mut data) {
        warn!("failed to read window icon: {err}");
        return WindowIcon::None;
    }
    let icon = decode_icon_stream(&data);
    if icon.is_none() {
        debug!("window icon of {} bytes could not be decoded", data.len());
    }
    icon
}
