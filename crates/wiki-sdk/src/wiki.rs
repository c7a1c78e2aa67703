use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info};
use wiki_accounts::AccountStore;
use wiki_pages::{HtmlValidator, Page, PageRepository, UploadReceipt};
use wiki_store::{BlobStore, FsBlobStore, InMemoryBlobStore};
use wiki_tags::{TagIndex, TagUpdate};
use wiki_types::FileKind;

use crate::config::{StorageBackend, WikiConfig};
use crate::error::{SdkError, SdkResult};
use crate::search::SearchEngine;

/// High-level WikiTrees API.
pub struct Wiki {
    pages: PageRepository,
    tags: TagIndex,
    accounts: AccountStore,
    search: SearchEngine,
    html: HtmlValidator,
}

impl std::fmt::Debug for Wiki {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wiki")
            .field("pages", &self.pages)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

impl Wiki {
    /// Open the containers named by `config` on its storage backend.
    pub fn open(config: &WikiConfig) -> SdkResult<Self> {
        config.validate()?;
        let containers = &config.containers;
        let (pages, images, accounts): (Arc<dyn BlobStore>, Arc<dyn BlobStore>, Arc<dyn BlobStore>) =
            match config.storage.backend {
                StorageBackend::Filesystem => {
                    let root = &config.storage.root;
                    (
                        Arc::new(FsBlobStore::open(root.join(&containers.pages))?),
                        Arc::new(FsBlobStore::open(root.join(&containers.images))?),
                        Arc::new(FsBlobStore::open(root.join(&containers.accounts))?),
                    )
                }
                StorageBackend::Memory => (
                    Arc::new(InMemoryBlobStore::new()),
                    Arc::new(InMemoryBlobStore::new()),
                    Arc::new(InMemoryBlobStore::new()),
                ),
            };
        info!(
            backend = ?config.storage.backend,
            root = %config.storage.root.display(),
            "opened wiki"
        );
        Self::from_stores(config, pages, images, accounts)
    }

    /// A wiki over fresh in-memory containers with default settings.
    pub fn in_memory() -> SdkResult<Self> {
        Self::open(&WikiConfig::in_memory())
    }

    /// Build a wiki over caller-supplied containers. `config.storage` is
    /// ignored.
    pub fn from_stores(
        config: &WikiConfig,
        pages: Arc<dyn BlobStore>,
        images: Arc<dyn BlobStore>,
        accounts: Arc<dyn BlobStore>,
    ) -> SdkResult<Self> {
        let tags = TagIndex::new(Arc::clone(&pages), config.tag_document()?)
            .with_options(config.tags.index.clone());
        Ok(Self {
            pages: PageRepository::new(pages, images).with_reserved(tags.document_key().clone()),
            tags,
            accounts: AccountStore::new(accounts),
            search: SearchEngine::new(config.search.clone()),
            html: HtmlValidator::new(),
        })
    }

    /// Create the empty tag document if it does not exist yet.
    pub fn init(&self) -> SdkResult<bool> {
        Ok(self.tags.initialize()?)
    }

    // ---- Pages and images ----

    pub fn get_wiki_page(&self, name: &str) -> SdkResult<Option<Page>> {
        Ok(self.pages.get_page(name)?)
    }

    pub fn list_page_names(&self) -> SdkResult<Vec<String>> {
        Ok(self.pages.list_page_names()?)
    }

    pub fn upload(
        &self,
        content: &[u8],
        name: &str,
        original_filename: &str,
    ) -> SdkResult<UploadReceipt> {
        Ok(self.pages.upload(content, name, original_filename)?)
    }

    pub fn get_image(&self, name: &str) -> SdkResult<Vec<u8>> {
        Ok(self.pages.get_image(name)?)
    }

    pub fn is_valid_html(&self, html: &str) -> bool {
        self.html.is_valid_html(html)
    }

    /// Validate `html`, store it as page `name` and register the page in the
    /// tag index.
    pub fn publish_page(&self, name: &str, html: &str) -> SdkResult<UploadReceipt> {
        if !FileKind::from_filename(name).is_page() {
            return Err(SdkError::InvalidOperation(format!(
                "{name:?} is not a page name"
            )));
        }
        if !self.is_valid_html(html) {
            return Err(SdkError::InvalidHtml {
                name: name.to_string(),
            });
        }
        let receipt = self.pages.upload(html.as_bytes(), name, name)?;
        let registered = self.tags.add_file_to_csv(name)?;
        debug!(name, registered, "published page");
        Ok(receipt)
    }

    // ---- Accounts ----

    pub fn sign_up(&self, username: &str, password: &str) -> SdkResult<bool> {
        Ok(self.accounts.sign_up(username, password)?)
    }

    pub fn sign_in(&self, username: &str, password: &str) -> SdkResult<bool> {
        Ok(self.accounts.sign_in(username, password)?)
    }

    // ---- Tags and search ----

    pub fn get_filenames_by_tag(&self, tag: &str) -> SdkResult<Vec<String>> {
        Ok(self.tags.get_filenames_by_tag(tag)?)
    }

    pub fn add_tag_to_csv(&self, filename: &str, tag: &str) -> SdkResult<TagUpdate> {
        Ok(self.tags.add_tag_to_csv(filename, tag)?)
    }

    pub fn add_file_to_csv(&self, filename: &str) -> SdkResult<bool> {
        Ok(self.tags.add_file_to_csv(filename)?)
    }

    pub fn tag_map(&self) -> SdkResult<BTreeMap<String, BTreeSet<String>>> {
        Ok(self.tags.tag_map()?)
    }

    /// Page names close to `query` plus every filename tagged with it.
    pub fn search(&self, query: &str) -> SdkResult<BTreeSet<String>> {
        let names = self.pages.list_page_names()?;
        let tagged = self.tags.get_filenames_by_tag(query)?;
        let results = self
            .search
            .search(query, names.iter().map(String::as_str), tagged);
        debug!(query, results = results.len(), "search");
        Ok(results)
    }

    // ---- Components ----

    pub fn pages(&self) -> &PageRepository {
        &self.pages
    }

    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn search_engine(&self) -> &SearchEngine {
        &self.search
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiki_pages::PageError;

    use crate::config::StorageConfig;

    fn wiki_with_trees() -> Wiki {
        let wiki = Wiki::in_memory().unwrap();
        for name in ["Coast Redwood", "Water Oak", "White Oak"] {
            wiki.publish_page(name, &format!("<p>{name}</p>")).unwrap();
        }
        wiki
    }

    #[test]
    fn missing_page_and_image_are_absent() {
        let wiki = Wiki::in_memory().unwrap();
        assert!(wiki.get_wiki_page("missing").unwrap().is_none());
        assert!(wiki.get_image("missing").unwrap().is_empty());
    }

    #[test]
    fn search_finds_fuzzy_and_tagged_pages() {
        let wiki = wiki_with_trees();
        wiki.publish_page("Live Quercus", "<p>a live oak</p>").unwrap();
        wiki.add_tag_to_csv("Live Quercus", "oak").unwrap();

        let results = wiki.search("oak").unwrap();
        assert!(results.contains("Water Oak"));
        assert!(results.contains("White Oak"));
        assert!(results.contains("Live Quercus"));
        assert!(!results.contains("Coast Redwood"));
    }

    #[test]
    fn publish_registers_page_once() {
        let wiki = wiki_with_trees();
        wiki.publish_page("Water Oak", "<p>updated</p>").unwrap();
        let map = wiki.tag_map().unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(
            wiki.get_wiki_page("Water Oak").unwrap().unwrap().content,
            "<p>updated</p>"
        );
    }

    #[test]
    fn publish_rejects_unsafe_html() {
        let wiki = Wiki::in_memory().unwrap();
        let err = wiki
            .publish_page("Palm", "<p>hi</p><script>x()</script>")
            .unwrap_err();
        assert!(matches!(err, SdkError::InvalidHtml { .. }));
        assert!(wiki.get_wiki_page("Palm").unwrap().is_none());
        assert!(wiki.tag_map().unwrap().is_empty());
    }

    #[test]
    fn publish_rejects_image_names() {
        let wiki = Wiki::in_memory().unwrap();
        assert!(matches!(
            wiki.publish_page("palm.png", "<p>x</p>"),
            Err(SdkError::InvalidOperation(_))
        ));
    }

    #[test]
    fn tag_document_is_not_a_page() {
        let wiki = wiki_with_trees();
        assert_eq!(
            wiki.list_page_names().unwrap(),
            vec!["Coast Redwood", "Water Oak", "White Oak"]
        );
        let err = wiki.upload(b"filename,tags\n", "tags.csv", "tags.csv").unwrap_err();
        assert!(matches!(err, SdkError::Page(PageError::Reserved { .. })));
    }

    #[test]
    fn tag_document_without_extension_stays_out_of_listing_and_search() {
        let mut config = WikiConfig::in_memory();
        config.tags.document = "tag-index".into();
        let wiki = Wiki::open(&config).unwrap();
        wiki.publish_page("Water Oak", "<p>oak</p>").unwrap();

        assert_eq!(wiki.list_page_names().unwrap(), vec!["Water Oak"]);
        assert!(!wiki.search("tag-index").unwrap().contains("tag-index"));
        assert!(wiki.tags().load().unwrap().get("Water Oak").is_some());
    }

    #[test]
    fn shared_page_and_account_container_is_rejected() {
        let mut config = WikiConfig::in_memory();
        config.containers.accounts = config.containers.pages.clone();
        assert!(matches!(Wiki::open(&config), Err(SdkError::Config(_))));
    }

    #[test]
    fn accounts_round_trip() {
        let wiki = Wiki::in_memory().unwrap();
        assert!(wiki.sign_up("u", "p").unwrap());
        assert!(!wiki.sign_up("u", "p2").unwrap());
        assert!(wiki.sign_in("u", "p").unwrap());
        assert!(!wiki.sign_in("u", "wrong").unwrap());
    }

    #[test]
    fn filesystem_wiki_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let config = WikiConfig {
            storage: StorageConfig {
                backend: StorageBackend::Filesystem,
                root: dir.path().to_path_buf(),
            },
            ..WikiConfig::default()
        };

        {
            let wiki = Wiki::open(&config).unwrap();
            assert!(wiki.init().unwrap());
            wiki.publish_page("Juniper", "<p>juniper</p>").unwrap();
            wiki.add_tag_to_csv("Juniper", "conifer").unwrap();
            wiki.upload(b"\xff\xd8", "juniper.jpg", "juniper.jpg").unwrap();
            wiki.sign_up("amy", "acorn").unwrap();
        }

        let wiki = Wiki::open(&config).unwrap();
        assert!(!wiki.init().unwrap());
        assert!(dir.path().join("wiki_content_p1").join("tags.csv").is_file());
        assert!(dir.path().join("users_passwords_p1").join("users").join("amy").is_file());
        assert_eq!(wiki.get_filenames_by_tag("conifer").unwrap(), vec!["Juniper"]);
        assert_eq!(wiki.get_image("juniper.jpg").unwrap(), vec![0xff, 0xd8]);
        assert!(wiki.sign_in("amy", "acorn").unwrap());
    }

    #[test]
    fn unavailable_errors_are_classified() {
        let err = SdkError::Tag(wiki_tags::TagError::Store(
            wiki_store::StoreError::Unavailable("down".into()),
        ));
        assert!(err.is_unavailable());
        assert!(!SdkError::InvalidOperation("x".into()).is_unavailable());
    }
}
