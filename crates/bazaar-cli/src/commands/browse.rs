//! Browse command implementation.
//!
//! Loads a list the way a screen does: page 1, then automatic loading as if
//! the user kept scrolling to the bottom until the automatic limit is hit,
//! then as many explicit "load more" steps as requested.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use futures_util::{StreamExt, pin_mut};
use serde::Serialize;

use bazaar_core::{ListFilters, PageSource, ProductId, UserId};
use bazaar_feed::{
    DEFAULT_AUTO_SCROLL_PAGE_LIMIT, DEFAULT_PAGE_SIZE, ItemCollection, ListConfig, ListController,
    LoadOutcome, ScrollMetrics, pages,
};
use bazaar_http::sources::{Favorites, Followers, HomeFeed, MoreFromSeller, SellerListings};

use crate::context::CliContext;
use crate::output;

#[derive(Args, Debug)]
pub struct BrowseArgs {
    #[command(subcommand)]
    pub list: ListKind,

    /// Items per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, global = true)]
    pub page_size: u32,

    /// Pages loaded by scrolling before an explicit "load more" is needed
    #[arg(long, default_value_t = DEFAULT_AUTO_SCROLL_PAGE_LIMIT, global = true)]
    pub auto_pages: u32,

    /// Explicit "load more" steps to take once automatic loading stops
    #[arg(long, default_value_t = 0, global = true, conflicts_with = "all")]
    pub load_more: u32,

    /// Fetch every page regardless of the automatic limit
    #[arg(long, global = true)]
    pub all: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Free-text search
    #[arg(long)]
    pub search: Option<String>,

    /// Category slug
    #[arg(long)]
    pub category: Option<String>,

    /// Sort order
    #[arg(long)]
    pub sort: Option<String>,
}

impl From<FilterArgs> for ListFilters {
    fn from(args: FilterArgs) -> Self {
        let mut filters = ListFilters::default();
        if let Some(search) = args.search {
            filters = filters.search(search);
        }
        if let Some(category) = args.category {
            filters = filters.category(category);
        }
        if let Some(sort) = args.sort {
            filters = filters.sort(sort);
        }
        filters
    }
}

#[derive(Subcommand, Debug)]
pub enum ListKind {
    /// The home feed of listed products
    Products(FilterArgs),

    /// Your favorited products
    Favorites,

    /// Products listed by a seller
    Listings {
        /// Seller user id
        #[arg(long)]
        seller: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Followers of a user
    Followers {
        /// User id
        #[arg(long)]
        user: String,
    },

    /// Other products from the seller of a product
    MoreFromSeller {
        /// Product id
        #[arg(long)]
        product: String,
    },
}

pub async fn run(ctx: &CliContext, args: BrowseArgs) -> Result<()> {
    let client = ctx.client.clone();
    let config = ListConfig::default()
        .with_page_size(args.page_size)
        .with_auto_scroll_page_limit(args.auto_pages);
    let plan = Plan {
        config,
        load_more: args.load_more,
        all: args.all,
    };

    match args.list {
        ListKind::Products(filters) => plan.run(HomeFeed::new(client), filters.into()).await,
        ListKind::Favorites => plan.run(Favorites::new(client), ()).await,
        ListKind::Listings { seller, filters } => {
            let seller = UserId::new(seller).context("Invalid seller id")?;
            plan.run(SellerListings::new(client, &seller), filters.into())
                .await
        }
        ListKind::Followers { user } => {
            let user = UserId::new(user).context("Invalid user id")?;
            plan.run(Followers::new(client, &user), ()).await
        }
        ListKind::MoreFromSeller { product } => {
            let product = ProductId::new(product).context("Invalid product id")?;
            plan.run(MoreFromSeller::new(client, &product), ()).await
        }
    }
}

struct Plan {
    config: ListConfig,
    load_more: u32,
    all: bool,
}

impl Plan {
    async fn run<S>(&self, source: S, filters: S::Filters) -> Result<()>
    where
        S: PageSource,
        S::Item: Serialize,
    {
        if self.all {
            return self.run_all(source, filters).await;
        }

        let controller = ListController::with_config(source, self.config);
        controller
            .refresh(filters)
            .await
            .context("Failed to load first page")?;

        // The terminal has no viewport; every scroll lands on the bottom.
        let bottom = ScrollMetrics::new(0.0, 0.0, 0.0);
        while let LoadOutcome::Loaded { .. } = controller
            .on_scroll(bottom)
            .await
            .context("Failed to load next page")?
        {}

        for _ in 0..self.load_more {
            match controller
                .load_more()
                .await
                .context("Failed to load more")?
            {
                LoadOutcome::Loaded { .. } => {}
                _ => break,
            }
        }

        let snapshot = controller.snapshot();
        for item in &snapshot.items {
            output::json_line(item)?;
        }

        output::progress(&format!(
            "{} items, page {} of {}",
            snapshot.items.len(),
            snapshot.cursor.current_page,
            snapshot.cursor.total_pages
        ));
        if snapshot.show_load_more {
            output::hint("More available. Pass --load-more N or --all to continue.");
        }

        Ok(())
    }

    async fn run_all<S>(&self, source: S, filters: S::Filters) -> Result<()>
    where
        S: PageSource,
        S::Item: Serialize,
    {
        let mut seen = ItemCollection::new();
        let stream = pages(&source, filters, self.config.page_size);
        pin_mut!(stream);

        while let Some(page) = stream.next().await {
            let page = page.context("Failed to load page")?;
            seen.append(page.items);
        }

        for item in seen.as_slice() {
            output::json_line(item)?;
        }
        output::progress(&format!("{} items", seen.len()));
        Ok(())
    }
}
