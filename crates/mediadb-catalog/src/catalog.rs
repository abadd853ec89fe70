//! Catalog facade over the GraphQL client.

use mediadb_graphql::{
    CancellationSignal, ClientSettings, GraphqlClient, GraphqlClientBuilder, GraphqlClientError,
    GraphqlOperation, RequestOptions,
};
use mediadb_loader::{IncrementalLoader, LoaderOptions, PageRequest, PageResult};
use tracing::debug;

use crate::operations::{
    MediaDetailQuery, MediaIdVariables, MediaSort, PageVariables, TopRatedMedia, TrendingMedia,
};
use crate::types::{MediaDetail, MediaSummary, PageData};

/// Media catalog backed by one shared [`GraphqlClient`].
///
/// Cheap to clone; clones share the client's limiter.
#[derive(Debug, Clone)]
pub struct Catalog {
    client: GraphqlClient,
}

impl Catalog {
    /// Wrap an existing client.
    #[must_use]
    pub const fn new(client: GraphqlClient) -> Self {
        Self { client }
    }

    /// Build a client from settings.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, GraphqlClientError> {
        let client = GraphqlClientBuilder::from_settings(settings)
            .with_service_name("mediadb")
            .build()?;
        Ok(Self::new(client))
    }

    /// Underlying client.
    #[must_use]
    pub const fn client(&self) -> &GraphqlClient {
        &self.client
    }

    /// One page of trending media.
    pub async fn trending_page(
        &self,
        request: PageRequest,
    ) -> Result<PageResult<MediaSummary>, GraphqlClientError> {
        self.media_page::<TrendingMedia>(request, MediaSort::TrendingDesc)
            .await
    }

    /// One page of top rated media.
    pub async fn top_rated_page(
        &self,
        request: PageRequest,
    ) -> Result<PageResult<MediaSummary>, GraphqlClientError> {
        self.media_page::<TopRatedMedia>(request, MediaSort::ScoreDesc)
            .await
    }

    async fn media_page<O>(
        &self,
        request: PageRequest,
        sort: MediaSort,
    ) -> Result<PageResult<MediaSummary>, GraphqlClientError>
    where
        O: GraphqlOperation<Variables = PageVariables, ResponseData = PageData>,
    {
        let variables = PageVariables {
            page: request.page,
            per_page: request.per_page,
            sort: vec![sort],
        };
        let data = self
            .client
            .execute::<O>(variables, RequestOptions::with_signal(request.signal))
            .await?;

        // Without page info the loader's short-page rule decides.
        let has_next_page = data.page.page_info.is_none_or(|info| info.has_next_page);
        debug!(
            operation = O::OPERATION_NAME,
            page = request.page,
            items = data.page.media.len(),
            has_next_page,
            "media page loaded"
        );
        Ok(PageResult::new(data.page.media, has_next_page))
    }

    /// Full details of one media entry.
    ///
    /// A missing entry fails with [`GraphqlClientError::NotFound`], whether
    /// upstream answers with `null` or with a 404 GraphQL error.
    pub async fn media_detail(
        &self,
        id: u64,
        signal: Option<CancellationSignal>,
    ) -> Result<MediaDetail, GraphqlClientError> {
        let options = signal.map_or_else(RequestOptions::default, RequestOptions::with_signal);
        let not_found = || GraphqlClientError::NotFound {
            what: format!("media {id}"),
        };

        match self
            .client
            .execute::<MediaDetailQuery>(MediaIdVariables { id }, options)
            .await
        {
            Ok(data) => data.media.ok_or_else(not_found),
            Err(GraphqlClientError::GraphqlErrors { errors })
                if errors.iter().any(|error| error.status == Some(404)) =>
            {
                Err(not_found())
            }
            Err(err) => Err(err),
        }
    }

    /// Loader over trending media.
    #[must_use]
    pub fn trending_loader(&self, options: LoaderOptions) -> IncrementalLoader<MediaSummary> {
        let catalog = self.clone();
        IncrementalLoader::new(
            move |request: PageRequest| {
                let catalog = catalog.clone();
                async move { catalog.trending_page(request).await }
            },
            options,
        )
    }

    /// Loader over top rated media.
    #[must_use]
    pub fn top_rated_loader(&self, options: LoaderOptions) -> IncrementalLoader<MediaSummary> {
        let catalog = self.clone();
        IncrementalLoader::new(
            move |request: PageRequest| {
                let catalog = catalog.clone();
                async move { catalog.top_rated_page(request).await }
            },
            options,
        )
    }
}
