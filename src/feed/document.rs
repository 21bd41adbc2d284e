// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use rss::Channel;
use rss::extension::itunes::ITunesChannelExtension;

use crate::error::StoreError;

const DEFAULT_TITLE: &str = "This American Archive";
const DEFAULT_LINK: &str = "https://www.thisamericanlife.org";
const DEFAULT_DESCRIPTION: &str = "Autogenerated feed of the This American Life archive.";
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_COPYRIGHT: &str = "Copyright © Ira Glass / This American Life";
const DEFAULT_IMAGE: &str = "https://i.imgur.com/pTMCfn9.png";

/// Suffix of the temporary file a feed is written to before it replaces the target
const PARTIAL_SUFFIX: &str = ".partial";

const INDENT_SIZE: usize = 2;

/// Channel metadata used when no seed template file is configured
pub fn default_channel() -> Channel {
    let mut itunes = ITunesChannelExtension::default();
    itunes.set_image(Some(DEFAULT_IMAGE.to_string()));

    let mut channel = Channel::default();
    channel.set_title(DEFAULT_TITLE);
    channel.set_link(DEFAULT_LINK);
    channel.set_description(DEFAULT_DESCRIPTION);
    channel.set_language(Some(DEFAULT_LANGUAGE.to_string()));
    channel.set_copyright(Some(DEFAULT_COPYRIGHT.to_string()));
    channel.set_itunes_ext(Some(itunes));
    channel
}

/// Read a feed document from disk
pub fn read_channel(path: &Path) -> Result<Channel, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut channel =
        Channel::read_from(BufReader::new(file)).map_err(|e| StoreError::ParseFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    // The writer declares the itunes namespace itself whenever extensions are present.
    let mut namespaces = channel.namespaces().clone();
    namespaces.remove("itunes");
    channel.set_namespaces(namespaces);

    Ok(channel)
}

/// Path of the temporary file used while writing `path`
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Write a feed document, replacing `path` only once the new file is complete
///
/// On failure the temporary file is removed and any previous file at
/// `path` is left as it was.
pub fn write_channel(channel: &Channel, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::WriteFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let partial = partial_path(path);

    let result = write_partial(channel, &partial).and_then(|()| {
        std::fs::rename(&partial, path).map_err(|e| StoreError::ReplaceFailed {
            path: path.to_path_buf(),
            source: e,
        })
    });

    if result.is_err() {
        let _ = std::fs::remove_file(&partial);
    }

    result
}

fn write_partial(channel: &Channel, partial: &Path) -> Result<(), StoreError> {
    let file = File::create(partial).map_err(|e| StoreError::WriteFailed {
        path: partial.to_path_buf(),
        source: e,
    })?;

    let writer = channel
        .pretty_write_to(BufWriter::new(file), b' ', INDENT_SIZE)
        .map_err(|e| StoreError::SerializeFailed {
            path: partial.to_path_buf(),
            source: e,
        })?;

    let file = writer.into_inner().map_err(|e| StoreError::WriteFailed {
        path: partial.to_path_buf(),
        source: e.into_error(),
    })?;

    file.sync_all().map_err(|e| StoreError::WriteFailed {
        path: partial.to_path_buf(),
        source: e,
    })
}
