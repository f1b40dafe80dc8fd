use crate::entity::Author;

/// Page size applied when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_SIZE: usize = 20;

/// Criteria shaping a read over the author collection. Ephemeral; never
/// persisted.
#[derive(Debug, Clone)]
pub struct AuthorsCriteria {
    pub main_category: Option<String>,
    pub search_query: Option<String>,
    page_number: usize,
    page_size: usize,
}

impl AuthorsCriteria {
    /// Build criteria, clamping the paging inputs: page numbers start at 1
    /// and page sizes are bounded by [`MAX_PAGE_SIZE`].
    pub fn new(
        main_category: Option<String>,
        search_query: Option<String>,
        page_number: Option<usize>,
        page_size: Option<usize>,
    ) -> Self {
        Self {
            main_category,
            search_query,
            page_number: page_number.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

impl Default for AuthorsCriteria {
    fn default() -> Self {
        Self::new(None, None, None, None)
    }
}

/// One page of results plus the metadata derived from the filtered-but-
/// unpaged count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub page_number: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        self.total_count.div_ceil(self.page_size)
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages()
    }
}

/// Run the filter pipeline: category match, then free-text search, then
/// pagination over a stable order (last name, first name, id) so repeated
/// calls against an unchanged store yield identical pages.
pub fn filter_authors(mut authors: Vec<Author>, criteria: &AuthorsCriteria) -> Page<Author> {
    if let Some(category) = criteria
        .main_category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        authors.retain(|author| author.main_category.trim().eq_ignore_ascii_case(category));
    }

    if let Some(query) = criteria
        .search_query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
    {
        let needle = query.to_lowercase();
        authors.retain(|author| author.searchable_text().contains(&needle));
    }

    authors.sort_by(|a, b| {
        a.last_name
            .to_lowercase()
            .cmp(&b.last_name.to_lowercase())
            .then_with(|| a.first_name.to_lowercase().cmp(&b.first_name.to_lowercase()))
            .then_with(|| a.id.cmp(&b.id))
    });

    let total_count = authors.len();
    let items = authors
        .into_iter()
        .skip((criteria.page_number() - 1) * criteria.page_size())
        .take(criteria.page_size())
        .collect();

    Page {
        items,
        total_count,
        page_number: criteria.page_number(),
        page_size: criteria.page_size(),
    }
}
