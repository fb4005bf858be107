//! Recording fakes shared by the integration tests.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;

use display_envoy::color::Rgb;
use display_envoy::topic::{
    FileSystem, JsonObject, MessagingService, Plugin, PluginDirectory, UploadDecision,
};
use display_envoy::{Error, Result};

/// Messaging service that records every call and can be told to refuse some URIs.
#[derive(Default)]
pub struct RecordingMessaging {
    pub subscribed: Vec<String>,
    pub unsubscribed: Vec<String>,
    pub refuse: BTreeSet<String>,
}

impl MessagingService for RecordingMessaging {
    fn subscribe(&mut self, uri: &str) -> Result<()> {
        if self.refuse.contains(uri) {
            return Err(Error::SubscribeFailed);
        }
        self.subscribed.push(uri.to_owned());
        Ok(())
    }

    fn unsubscribe(&mut self, uri: &str) -> Result<()> {
        self.unsubscribed.push(uri.to_owned());
        Ok(())
    }
}

/// File system kept in memory. `fail_create` makes every write fail.
#[derive(Default)]
pub struct MemoryFileSystem {
    pub files: BTreeMap<String, Vec<u8>>,
    pub fail_create: bool,
}

impl FileSystem for MemoryFileSystem {
    fn write_file(&mut self, path: &str, contents: &[u8]) -> Result<()> {
        if self.fail_create {
            return Err(Error::FileCreate);
        }
        self.files.insert(path.to_owned(), contents.to_vec());
        Ok(())
    }
}

/// Plugin that records what it receives.
pub struct RecordingPlugin {
    pub uid: u16,
    pub alias: String,
    pub topics: Vec<String>,
    /// Directory accepted uploads go to; `None` rejects every upload.
    pub upload_dir: Option<String>,
    pub accept_payloads: bool,
    pub received: Vec<(String, JsonObject)>,
}

impl RecordingPlugin {
    pub fn new(uid: u16, alias: &str, topics: &[&str]) -> Self {
        Self {
            uid,
            alias: alias.to_owned(),
            topics: topics.iter().map(|topic| (*topic).to_owned()).collect(),
            upload_dir: None,
            accept_payloads: true,
            received: Vec::new(),
        }
    }

    pub fn with_upload_dir(mut self, dir: &str) -> Self {
        self.upload_dir = Some(dir.to_owned());
        self
    }
}

impl Plugin for RecordingPlugin {
    fn uid(&self) -> u16 {
        self.uid
    }

    fn alias(&self) -> &str {
        &self.alias
    }

    fn name(&self) -> &str {
        "RecordingPlugin"
    }

    fn topics(&self) -> Vec<String> {
        self.topics.clone()
    }

    fn is_upload_accepted(&self, _topic: &str, file_name: &str) -> UploadDecision {
        match &self.upload_dir {
            Some(dir) => UploadDecision::Accepted {
                full_path: format!("{dir}/{file_name}"),
            },
            None => UploadDecision::Rejected,
        }
    }

    fn set_topic(&mut self, topic: &str, value: &JsonObject) -> bool {
        self.received.push((topic.to_owned(), value.clone()));
        self.accept_payloads
    }
}

/// A fixed set of [`RecordingPlugin`]s.
pub struct Plugins(pub Vec<RecordingPlugin>);

impl Plugins {
    pub fn get(&self, uid: u16) -> &RecordingPlugin {
        self.0
            .iter()
            .find(|plugin| plugin.uid == uid)
            .expect("plugin exists")
    }
}

impl PluginDirectory for Plugins {
    fn plugin_mut(&mut self, uid: u16) -> Option<&mut dyn Plugin> {
        self.0
            .iter_mut()
            .find(|plugin| plugin.uid == uid)
            .map(|plugin| plugin as &mut dyn Plugin)
    }
}

/// `smart-leds` writer that keeps every frame it is given.
#[derive(Default)]
pub struct RecordingWriter {
    pub frames: Vec<Vec<Rgb>>,
}

impl smart_leds::SmartLedsWrite for RecordingWriter {
    type Error = Infallible;
    type Color = Rgb;

    fn write<T, I>(&mut self, iterator: T) -> core::result::Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        self.frames
            .push(iterator.into_iter().map(Into::into).collect());
        Ok(())
    }
}

/// `smart-leds` writer that always fails.
pub struct FailingWriter;

impl smart_leds::SmartLedsWrite for FailingWriter {
    type Error = ();
    type Color = Rgb;

    fn write<T, I>(&mut self, _iterator: T) -> core::result::Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        Err(())
    }
}
