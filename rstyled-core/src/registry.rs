//! Reference counted registry of style containers.
//!
//! Registry maps [`CanonicalText`] to an entry with generated class name,
//! reference counter and owned style container.
//! Entries are never removed, so class name is stable for the whole registry lifetime.
//! Container is attached to the document when counter goes from 0 to 1,
//! and detached when it goes back to 0.
//!
//! Work is split in two phases:
//! - [`StyleRegistry::entry`] is safe to call during render, it only creates an entry.
//! - [`StyleRegistry::acquire`], [`StyleLease::sync`] and lease drop mutate the document,
//!   and should run in commit phase of the host framework.
//!
//! Registry is single threaded, handles are cheap `Rc` clones.
use std::{borrow::Cow, cell::RefCell, collections::HashMap, fmt, rc::Rc};

use crate::{class_name::ClassNameGenerator, CanonicalText, Error, Result};

/// Document primitive, that registry uses to manage style containers.
pub trait StyleHost {
    type Node;

    fn create_container(&self) -> Self::Node;
    fn attach(&self, node: &Self::Node);
    fn detach(&self, node: &Self::Node);
    fn text_content(&self, node: &Self::Node) -> Option<String>;
    fn set_text_content(&self, node: &Self::Node, text: &str);
}

#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub class_prefix: Cow<'static, str>,
    /// Count of random symbols after prefix.
    pub ident_len: usize,
    /// Fixed seed for class names. When not set, each registry gets its own stream.
    pub seed: Option<u64>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            class_prefix: "css".into(),
            ident_len: 7,
            seed: None,
        }
    }
}

struct Entry<N> {
    class_name: String,
    ref_count: usize,
    container: N,
}

struct RegistryState<H: StyleHost> {
    host: H,
    generator: ClassNameGenerator,
    entries: HashMap<CanonicalText, Entry<H::Node>>,
}

fn get_or_create<'a, H: StyleHost>(
    entries: &'a mut HashMap<CanonicalText, Entry<H::Node>>,
    generator: &mut ClassNameGenerator,
    host: &H,
    key: &CanonicalText,
) -> &'a mut Entry<H::Node> {
    entries.entry(key.clone()).or_insert_with(|| {
        let class_name = generator.next_name();
        log::trace!("new style entry {class_name}");
        Entry {
            class_name,
            ref_count: 0,
            container: host.create_container(),
        }
    })
}

pub struct StyleRegistry<H: StyleHost> {
    state: Rc<RefCell<RegistryState<H>>>,
}

impl<H: StyleHost> Clone for StyleRegistry<H> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<H: StyleHost> fmt::Debug for StyleRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

impl<H: StyleHost> StyleRegistry<H> {
    pub fn new(host: H) -> Self {
        Self::with_options(host, RegistryOptions::default())
    }

    pub fn with_options(host: H, options: RegistryOptions) -> Self {
        Self {
            state: Rc::new(RefCell::new(RegistryState {
                host,
                generator: ClassNameGenerator::new(&options),
                entries: HashMap::new(),
            })),
        }
    }

    /// Get or create entry for this rule text, and return its class name.
    /// Doesn't change reference counter and doesn't touch the document,
    /// so it can be called any number of times during render.
    pub fn entry(&self, key: &CanonicalText) -> String {
        let mut state = self.state.borrow_mut();
        let RegistryState {
            host,
            generator,
            entries,
        } = &mut *state;
        get_or_create(entries, generator, &*host, key).class_name.clone()
    }

    /// Increment reference counter for this rule text.
    /// Container is attached to the document on first acquire.
    ///
    /// Returned lease will release the entry on drop.
    pub fn acquire(&self, key: &CanonicalText) -> StyleLease<H> {
        let mut state = self.state.borrow_mut();
        let RegistryState {
            host,
            generator,
            entries,
        } = &mut *state;
        let entry = get_or_create(entries, generator, &*host, key);
        entry.ref_count += 1;
        let class_name = entry.class_name.clone();
        if entry.ref_count == 1 {
            log::trace!("attach style {class_name}");
            host.attach(&entry.container);
        }
        drop(state);
        StyleLease {
            registry: self.clone(),
            key: key.clone(),
            class_name,
        }
    }

    /// Write resolved css into container, if it differs from current content.
    /// Returns true if write was done.
    pub fn sync(&self, key: &CanonicalText) -> Result<bool> {
        let state = self.state.borrow();
        let entry = state.entries.get(key).ok_or(Error::UnknownStyle)?;
        let resolved = key.resolve(&entry.class_name);
        if state.host.text_content(&entry.container).as_deref() == Some(resolved.as_str()) {
            return Ok(false);
        }
        log::debug!("update style content of {}", entry.class_name);
        state.host.set_text_content(&entry.container, &resolved);
        Ok(true)
    }

    /// Decrement reference counter for this rule text.
    /// Container is detached from the document when counter reaches zero.
    ///
    /// Releasing unknown key or releasing more than acquired is a no-op that returns error.
    pub fn release(&self, key: &CanonicalText) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        let Some(entry) = state.entries.get_mut(key) else {
            log::warn!("release of style that was never acquired");
            return Err(Error::UnknownStyle);
        };
        if entry.ref_count == 0 {
            log::warn!("style {} released more times than acquired", entry.class_name);
            return Err(Error::UnbalancedRelease {
                class_name: entry.class_name.clone(),
            });
        }
        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            log::trace!("detach style {}", entry.class_name);
            state.host.detach(&entry.container);
        }
        Ok(())
    }

    pub fn class_name(&self, key: &CanonicalText) -> Option<String> {
        self.state
            .borrow()
            .entries
            .get(key)
            .map(|entry| entry.class_name.clone())
    }

    pub fn ref_count(&self, key: &CanonicalText) -> Option<usize> {
        self.state
            .borrow()
            .entries
            .get(key)
            .map(|entry| entry.ref_count)
    }

    /// Container of the entry is in the document.
    pub fn is_attached(&self, key: &CanonicalText) -> bool {
        self.ref_count(key).is_some_and(|count| count > 0)
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn with_host<R>(&self, func: impl FnOnce(&H) -> R) -> R {
        func(&self.state.borrow().host)
    }
}

/// Acquired reference to a registry entry.
/// Releases the entry exactly once, when dropped.
#[must_use = "Style is released as soon as lease is dropped"]
pub struct StyleLease<H: StyleHost> {
    registry: StyleRegistry<H>,
    key: CanonicalText,
    class_name: String,
}

impl<H: StyleHost> StyleLease<H> {
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn key(&self) -> &CanonicalText {
        &self.key
    }

    /// Sync container content with resolved css.
    /// Returns true if container was written.
    pub fn sync(&self) -> bool {
        // Lease keeps entry acquired, so it always exists.
        self.registry.sync(&self.key).unwrap_or(false)
    }
}

impl<H: StyleHost> fmt::Debug for StyleLease<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleLease")
            .field("class_name", &self.class_name)
            .finish()
    }
}

impl<H: StyleHost> Drop for StyleLease<H> {
    fn drop(&mut self) {
        let _ = self.registry.release(&self.key);
    }
}
