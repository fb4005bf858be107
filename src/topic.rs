//! Bridges a publish/subscribe transport onto per-plugin topics, including file upload.
//!
//! Each plugin declares topic fragments such as `/text`. [`TopicHandler::register_topics`]
//! subscribes every fragment under the plugin's UID namespace and, when the plugin has an alias,
//! under its alias namespace too:
//!
//! ```text
//! /display/uid/<uid><topic>
//! /display/alias/<alias><topic>
//! ```
//!
//! The handler keeps a table from subscription URI to `(plugin UID, topic)`. The transport hands
//! every inbound message to [`TopicHandler::handle_message`], which looks the URI up, decodes the
//! JSON payload, stores an attached file if the plugin accepts it, and forwards the object to
//! the plugin's [`Plugin::set_topic`].
//!
//! A payload carrying both a string `fileName` and a string `file` (base64, padding optional,
//! line breaks and other ASCII whitespace ignored) is a file transfer.
//! If the plugin accepts it, the decoded bytes are written to the path the plugin chose, the two
//! fields are removed, and `fullPath` is added:
//!
//! ```text
//! {"fileName":"a.bmp","file":"AQID"}  ->  file /img/a.bmp = 01 02 03
//!                                      ->  set_topic("/icon", {"fullPath":"/img/a.bmp"})
//! ```

use alloc::{
    collections::BTreeMap,
    format,
    string::String,
    vec,
    vec::Vec,
};

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde_json::Value;

use crate::fmt::DisplayFmt;
use crate::{Error, Result};

/// JSON object exchanged with plugins.
pub type JsonObject = serde_json::Map<String, Value>;

/// Root of every subscription URI.
pub const BASE_URI_PREFIX: &str = "/display";

/// Default cap on the number of topics taken from one plugin (`16`).
pub const MAX_TOPICS_DEFAULT: usize = 16;

/// Default cap on the size of an inbound payload, in bytes (`4096`).
pub const MAX_PAYLOAD_LEN_DEFAULT: usize = 4096;

/// Payload field naming an uploaded file.
pub const FILE_NAME_FIELD: &str = "fileName";

/// Payload field carrying the base64-encoded file content.
pub const FILE_FIELD: &str = "file";

/// Field added to the forwarded object with the stored file's path.
pub const FULL_PATH_FIELD: &str = "fullPath";

// Accepts base64 with or without trailing padding.
const FILE_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Base URI of a plugin addressed by UID, e.g. `/display/uid/7`.
#[must_use]
pub fn base_uri_by_uid(uid: u16) -> String {
    format!("{BASE_URI_PREFIX}/uid/{uid}")
}

/// Base URI of a plugin addressed by alias, e.g. `/display/alias/clock`.
#[must_use]
pub fn base_uri_by_alias(alias: &str) -> String {
    format!("{BASE_URI_PREFIX}/alias/{alias}")
}

/// A plugin's answer to a proposed file upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadDecision {
    /// Do not store the file; the whole message is dropped.
    Rejected,
    /// Store the file at `full_path`.
    Accepted {
        /// Destination path in the file system.
        full_path: String,
    },
}

/// A display plugin, as far as topic handling is concerned.
///
/// The host application owns plugins and controls their lifecycle.
pub trait Plugin {
    /// Unique numeric id.
    fn uid(&self) -> u16;

    /// Unique alias, or an empty string when the plugin has none.
    fn alias(&self) -> &str;

    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Topic fragments the plugin serves, e.g. `["/text", "/icon"]`.
    fn topics(&self) -> Vec<String>;

    /// Decide whether `file_name` may be uploaded through `topic`, and where to store it.
    fn is_upload_accepted(&self, topic: &str, file_name: &str) -> UploadDecision;

    /// Deliver a decoded payload for `topic`. Returns `false` if the plugin rejects it.
    fn set_topic(&mut self, topic: &str, value: &JsonObject) -> bool;
}

/// Finds live plugins by UID when a message arrives.
pub trait PluginDirectory {
    /// The plugin with `uid`, if it is still around.
    fn plugin_mut(&mut self, uid: u16) -> Option<&mut dyn Plugin>;
}

impl PluginDirectory for [alloc::boxed::Box<dyn Plugin>] {
    fn plugin_mut(&mut self, uid: u16) -> Option<&mut dyn Plugin> {
        self.iter_mut()
            .find(|plugin| plugin.uid() == uid)
            .map(|plugin| &mut **plugin as &mut dyn Plugin)
    }
}

impl PluginDirectory for Vec<alloc::boxed::Box<dyn Plugin>> {
    fn plugin_mut(&mut self, uid: u16) -> Option<&mut dyn Plugin> {
        self.as_mut_slice().plugin_mut(uid)
    }
}

/// Publish/subscribe transport.
///
/// The transport routes every message received on a subscribed URI to
/// [`TopicHandler::handle_message`].
pub trait MessagingService {
    /// Start delivering messages published on `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SubscribeFailed`] if the transport refuses the subscription.
    fn subscribe(&mut self, uri: &str) -> Result<()>;

    /// Stop delivering messages for `uri`. Must succeed when `uri` is not subscribed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsubscribeFailed`] if the transport cannot drop the subscription.
    fn unsubscribe(&mut self, uri: &str) -> Result<()>;
}

/// Where uploaded files go.
pub trait FileSystem {
    /// Create the file at `path` (truncating an existing one) and write `contents`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileCreate`] if the file cannot be opened for writing and
    /// [`Error::FileWrite`] if writing fails.
    fn write_file(&mut self, path: &str, contents: &[u8]) -> Result<()>;
}

/// Which base URI a binding was subscribed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Namespace {
    /// `/display/uid/<uid>`
    Uid,
    /// `/display/alias/<alias>`
    Alias,
}

/// A live subscription: which plugin and topic a subscription URI belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicBinding {
    /// UID of the plugin that declared the topic.
    pub uid: u16,
    /// Topic fragment as declared by the plugin.
    pub topic: String,
    /// Base URI the topic was subscribed under.
    pub namespace: Namespace,
}

/// Resource limits for topic handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TopicLimits {
    /// Topics taken from one plugin; extra declared topics are dropped.
    pub max_topics: usize,
    /// Largest inbound payload, in bytes, that is decoded.
    pub max_payload_len: usize,
}

impl Default for TopicLimits {
    fn default() -> Self {
        Self {
            max_topics: MAX_TOPICS_DEFAULT,
            max_payload_len: MAX_PAYLOAD_LEN_DEFAULT,
        }
    }
}

/// Registers plugin topics with a [`MessagingService`] and dispatches inbound messages.
///
/// See the [module documentation](mod@crate::topic) for the URI scheme and payload format.
pub struct TopicHandler<M, F> {
    messaging: M,
    file_system: F,
    limits: TopicLimits,
    bindings: BTreeMap<String, TopicBinding>,
}

impl<M: MessagingService, F: FileSystem> TopicHandler<M, F> {
    /// Create a handler with [`TopicLimits::default`].
    #[must_use]
    pub fn new(messaging: M, file_system: F) -> Self {
        Self::with_limits(messaging, file_system, TopicLimits::default())
    }

    /// Create a handler with explicit limits.
    #[must_use]
    pub const fn with_limits(messaging: M, file_system: F, limits: TopicLimits) -> Self {
        Self {
            messaging,
            file_system,
            limits,
            bindings: BTreeMap::new(),
        }
    }

    /// Subscribe every topic `plugin` declares, under its UID and (if any) alias base URI.
    ///
    /// A failed subscription is logged and skipped; the others still go through. Registering a
    /// plugin again re-subscribes and replaces its bindings.
    pub fn register_topics<P: Plugin + ?Sized>(&mut self, plugin: &P) {
        let topics = self.declared_topics(plugin);
        if topics.is_empty() {
            return;
        }
        let uid = plugin.uid();
        let bases = base_uris(plugin);
        let mut subscribed: usize = 0;

        for topic in &topics {
            for (namespace, base_uri) in &bases {
                let uri = format!("{base_uri}{topic}");
                match self.messaging.subscribe(&uri) {
                    Ok(()) => {
                        let binding = TopicBinding {
                            uid,
                            topic: topic.clone(),
                            namespace: *namespace,
                        };
                        let replaced = self.bindings.insert(uri, binding);
                        if let Some(replaced) = replaced.filter(|replaced| replaced.uid != uid) {
                            warn!(
                                "[{}][{}] took over a topic bound to plugin {}",
                                plugin.name(),
                                uid,
                                replaced.uid
                            );
                        }
                        subscribed = subscribed.saturating_add(1);
                    }
                    Err(err) => warn!("Couldn't subscribe {}: {}", uri.as_str(), DisplayFmt(&err)),
                }
            }
        }
        info!(
            "[{}][{}] subscribed {} topic URIs",
            plugin.name(),
            uid,
            subscribed
        );
    }

    /// Unsubscribe every URI [`Self::register_topics`] would compute for `plugin` now.
    ///
    /// Safe to repeat: URIs without a live subscription are passed to the transport anyway and
    /// failures are only logged.
    pub fn unregister_topics<P: Plugin + ?Sized>(&mut self, plugin: &P) {
        let topics = self.declared_topics(plugin);
        if topics.is_empty() {
            return;
        }
        let bases = base_uris(plugin);

        for topic in &topics {
            for (_, base_uri) in &bases {
                let uri = format!("{base_uri}{topic}");
                self.bindings.remove(&uri);
                if let Err(err) = self.messaging.unsubscribe(&uri) {
                    warn!("Couldn't unsubscribe {}: {}", uri.as_str(), DisplayFmt(&err));
                }
            }
        }
        info!("[{}][{}] unsubscribed topics", plugin.name(), plugin.uid());
    }

    /// Handle a message the transport received on `uri`.
    ///
    /// The binding is found by exact URI or, for transports that prefix topics (a device name,
    /// say), by the longest bound URI that `uri` ends with. Every failure is logged and ends
    /// processing of this one message; nothing is retried.
    pub fn handle_message<D: PluginDirectory + ?Sized>(
        &mut self,
        plugins: &mut D,
        uri: &str,
        payload: &[u8],
    ) {
        let Some(TopicBinding { uid, topic, .. }) = self.resolve(uri).cloned() else {
            debug!("No binding for {}", uri);
            return;
        };
        let Some(plugin) = plugins.plugin_mut(uid) else {
            warn!("{}", DisplayFmt(&Error::UnknownPlugin { uid }));
            return;
        };
        let mut object = match self.decode_payload(payload) {
            Ok(object) => object,
            Err(err) => {
                warn!("Received invalid payload: {}", DisplayFmt(&err));
                return;
            }
        };

        if let Some(transfer) = take_file_transfer(&mut object) {
            let full_path = match plugin.is_upload_accepted(&topic, &transfer.file_name) {
                UploadDecision::Rejected => {
                    warn!("[{}][{}] Upload not supported.", plugin.name(), uid);
                    return;
                }
                UploadDecision::Accepted { full_path } => full_path,
            };
            if let Err(err) = self.store_file(&full_path, &transfer.content) {
                match err {
                    Error::Base64Decode(_) => {
                        warn!("Received invalid file content: {}", DisplayFmt(&err));
                        return;
                    }
                    _ => error!(
                        "Couldn't store file {}: {}",
                        full_path.as_str(),
                        DisplayFmt(&err)
                    ),
                }
            }
            object.insert(String::from(FULL_PATH_FIELD), Value::String(full_path));
        }

        trace!("[{}][{}] forwarding {}", plugin.name(), uid, topic.as_str());
        if !plugin.set_topic(&topic, &object) {
            warn!("Plugin {} rejected payload.", uid);
        }
    }

    /// Binding for a subscription URI, if one is live.
    #[must_use]
    pub fn binding(&self, uri: &str) -> Option<&TopicBinding> {
        self.bindings.get(uri)
    }

    /// Whether `uri` has a live subscription.
    #[must_use]
    pub fn is_subscribed(&self, uri: &str) -> bool {
        self.bindings.contains_key(uri)
    }

    /// Every live binding, ordered by subscription URI.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &TopicBinding)> {
        self.bindings
            .iter()
            .map(|(uri, binding)| (uri.as_str(), binding))
    }

    /// Limits in effect.
    #[must_use]
    pub const fn limits(&self) -> TopicLimits {
        self.limits
    }

    /// The messaging transport.
    #[must_use]
    pub const fn messaging(&self) -> &M {
        &self.messaging
    }

    /// Mutable access to the messaging transport.
    pub const fn messaging_mut(&mut self) -> &mut M {
        &mut self.messaging
    }

    /// The file system uploads are written to.
    #[must_use]
    pub const fn file_system(&self) -> &F {
        &self.file_system
    }

    fn declared_topics<P: Plugin + ?Sized>(&self, plugin: &P) -> Vec<String> {
        let mut topics = plugin.topics();
        if topics.len() > self.limits.max_topics {
            warn!(
                "[{}][{}] declares {} topics, keeping the first {}",
                plugin.name(),
                plugin.uid(),
                topics.len(),
                self.limits.max_topics
            );
            topics.truncate(self.limits.max_topics);
        }
        topics
    }

    // Any match ends with its bound URI and so with the binding's topic; a shared base URI
    // never picks up another topic's messages.
    fn resolve(&self, uri: &str) -> Option<&TopicBinding> {
        self.bindings.get(uri).or_else(|| {
            self.bindings
                .iter()
                .filter(|(bound_uri, _)| uri.ends_with(bound_uri.as_str()))
                .max_by_key(|(bound_uri, _)| bound_uri.len())
                .map(|(_, binding)| binding)
        })
    }

    fn decode_payload(&self, payload: &[u8]) -> Result<JsonObject> {
        if payload.len() > self.limits.max_payload_len {
            return Err(Error::PayloadTooLarge {
                len: payload.len(),
                max: self.limits.max_payload_len,
            });
        }
        Ok(serde_json::from_slice(payload)?)
    }

    fn store_file(&mut self, full_path: &str, encoded: &str) -> Result<()> {
        let contents = decode_file(encoded)?;
        self.file_system.write_file(full_path, &contents)
    }
}

fn base_uris<P: Plugin + ?Sized>(plugin: &P) -> Vec<(Namespace, String)> {
    let mut bases = vec![(Namespace::Uid, base_uri_by_uid(plugin.uid()))];
    let alias = plugin.alias();
    if !alias.is_empty() {
        bases.push((Namespace::Alias, base_uri_by_alias(alias)));
    }
    bases
}

struct FileTransfer {
    file_name: String,
    content: String,
}

/// Remove `fileName` and `file` from `object` when both are strings.
fn take_file_transfer(object: &mut JsonObject) -> Option<FileTransfer> {
    if !matches!(
        (object.get(FILE_NAME_FIELD), object.get(FILE_FIELD)),
        (Some(Value::String(_)), Some(Value::String(_)))
    ) {
        return None;
    }
    match (object.remove(FILE_NAME_FIELD), object.remove(FILE_FIELD)) {
        (Some(Value::String(file_name)), Some(Value::String(content))) => {
            Some(FileTransfer { file_name, content })
        }
        _ => None,
    }
}

/// Decode base64 into a buffer sized to the maximum decoded length, trimmed to the real length.
///
/// ASCII whitespace is skipped, so line-wrapped uploads decode. Any other character outside the
/// standard alphabet fails the whole transfer.
fn decode_file(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded
        .chars()
        .filter(|character| !character.is_ascii_whitespace())
        .collect();
    let mut buffer = vec![0_u8; base64::decoded_len_estimate(compact.len())];
    let decoded_len = FILE_BASE64.decode_slice(&compact, &mut buffer)?;
    buffer.truncate(decoded_len);
    Ok(buffer)
}
