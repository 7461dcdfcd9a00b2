use crate::pipeline::Shape;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// A command-line client for the Terminal Market marketplace
///
/// tm talks to the hosted marketplace API from your terminal: browse and
/// search products, buy through hosted checkout, manage your cart, run AI
/// models, and keep standing watch rules on the catalog. A session cookie
/// and a few preferences are cached locally; everything else lives on the
/// server.
#[derive(Parser, Debug)]
#[command(name = "tm", version, author)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Use a different API base URL for this invocation only
    #[arg(long, global = true, value_name = "URL")]
    pub api: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in
    Register {
        email: String,
        /// Display name for the new account
        #[arg(long)]
        name: Option<String>,
        /// Password; prompted interactively when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign in to an existing account
    ///
    /// Stores the session cookie in the local config file so later commands
    /// are authenticated. The password is prompted with masked input unless
    /// --password is given.
    Login {
        email: String,
        /// Password; prompted interactively when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out and discard the local session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Update your profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },

    /// Manage the default location used to bias listings
    #[command(subcommand)]
    Location(LocationCommand),

    /// Inspect or change local client settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Search the catalog
    ///
    /// Runs a server-side search. If the server search fails for any reason
    /// the full product list is fetched instead and filtered locally by
    /// substring match.
    Search {
        query: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long, value_name = "PRICE")]
        price_min: Option<f64>,
        #[arg(long, value_name = "PRICE")]
        price_max: Option<f64>,
        /// Ask the server for at most this many results
        #[arg(long, value_name = "N")]
        limit: Option<u32>,
        #[command(flatten)]
        shape: ShapeArgs,
    },

    /// List products
    Products {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[command(flatten)]
        shape: ShapeArgs,
    },

    /// Show one product with its offers
    Product {
        /// Product id or slug
        id: String,
    },

    /// List sellers
    Sellers {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[command(flatten)]
        shape: ShapeArgs,
    },

    /// Show one seller
    Seller { id: String },

    /// List reviews for a store
    Reviews {
        store_id: String,
        #[command(flatten)]
        list: ListArgs,
    },

    /// Leave a review for a store
    Review {
        store_id: String,
        /// Star rating from 1 to 5
        #[arg(long)]
        rating: i64,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Buy a product through its checkout page
    ///
    /// Resolves the product by id then by slug, records the purchase intent,
    /// and opens the checkout URL in your browser. Set TM_NO_BROWSER=1 or
    /// pass --no-browser to print the URL instead.
    Buy {
        /// Product id or slug
        product: String,
        /// Buy a specific offer instead of the default
        #[arg(long, value_name = "OFFER_ID")]
        offer: Option<String>,
        /// Print the checkout URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Manage the shopping cart
    #[command(subcommand)]
    Cart(CartCommand),

    /// List your orders
    Orders {
        /// Only show orders with this status
        #[arg(long)]
        status: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },

    /// Run and chat with marketplace AI models
    #[command(subcommand)]
    Ai(AiCommand),

    /// Show your credit balance, or buy more
    Credits {
        #[command(subcommand)]
        action: Option<CreditsCommand>,
    },

    /// Manage command aliases stored on your account
    #[command(subcommand)]
    Alias(AliasCommand),

    /// Show your rewards
    Rewards,

    /// Manage recurring product subscriptions
    #[command(subcommand)]
    Subs(SubsCommand),

    /// Manage your wishlist
    #[command(subcommand)]
    Wishlist(WishlistCommand),

    /// Manage account webhooks
    #[command(subcommand)]
    Webhooks(WebhooksCommand),

    /// Manage standing watch rules over the catalog
    #[command(subcommand)]
    Watch(WatchCommand),

    /// Post and browse buyer requests
    #[command(subcommand)]
    Requests(RequestsCommand),

    /// List open vacancies
    Vacancies {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Show one vacancy
    Vacancy { id: String },

    /// Apply to a vacancy
    Apply {
        vacancy_id: String,
        #[arg(long)]
        message: Option<String>,
    },

    /// Browse and download purchased digital items
    #[command(subcommand)]
    Library(LibraryCommand),
}

/// Client-side shaping shared by list commands.
#[derive(Args, Debug, Default, Clone)]
pub struct ShapeArgs {
    /// Sort by a field; prefix with '-' for descending (e.g. --sort -price)
    #[arg(long, value_name = "FIELD", allow_hyphen_values = true)]
    pub sort: Option<String>,
    /// Keep only the first N rows
    #[arg(long, value_name = "N")]
    pub head: Option<usize>,
    /// Print only the number of rows
    #[arg(long)]
    pub count: bool,
}

/// Head/count shaping for commands without a sort axis.
#[derive(Args, Debug, Default, Clone)]
pub struct ListArgs {
    /// Keep only the first N rows
    #[arg(long, value_name = "N")]
    pub head: Option<usize>,
    /// Print only the number of rows
    #[arg(long)]
    pub count: bool,
}

impl From<ShapeArgs> for Shape {
    fn from(args: ShapeArgs) -> Self {
        Shape {
            sort: args.sort,
            head: args.head,
            count: args.count,
        }
    }
}

impl From<ListArgs> for Shape {
    fn from(args: ListArgs) -> Self {
        Shape {
            sort: None,
            head: args.head,
            count: args.count,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum LocationCommand {
    /// Set the default city and country
    Set { city: String, country: String },
    /// Show the stored location
    Show,
    /// Clear the stored location
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the local configuration
    Show,
    /// Point the client at a different API base URL
    SetApi { url: String },
    /// Change the session cookie name matched on responses
    SetCookieName { name: String },
    /// Reset all local state, including the session
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum CartCommand {
    /// Show the cart contents
    Show,
    /// Add a product to the cart
    Add {
        /// Product id or slug
        product: String,
        #[arg(long)]
        qty: Option<u32>,
    },
    /// Remove a cart item
    Remove { item_id: String },
    /// Check out the cart through the hosted checkout page
    Checkout,
}

#[derive(Subcommand, Debug)]
pub enum AiCommand {
    /// List available AI models
    Models,
    /// Run a model once over the given input
    Run {
        model: String,
        /// Input text; all remaining words are joined
        #[arg(trailing_var_arg = true)]
        input: Vec<String>,
    },
    /// Start an interactive chat session with a model
    ///
    /// Each turn is sent to the model together with the server's response id
    /// from the previous turn, so stateful agents keep their context. Type
    /// 'exit' or press Ctrl-D to end the session.
    Chat { model: String },
}

#[derive(Subcommand, Debug)]
pub enum CreditsCommand {
    /// Buy a credit pack through the hosted checkout page
    Buy { pack: String },
}

#[derive(Subcommand, Debug)]
pub enum AliasCommand {
    /// List your aliases
    List,
    /// Create an alias
    Add { name: String, target: String },
    /// Change what an alias points at
    Update { name: String, target: String },
    /// Delete an alias
    Rm { name: String },
}

#[derive(Subcommand, Debug)]
pub enum SubsCommand {
    /// List your subscriptions
    List,
    /// Subscribe to a recurring product delivery
    Create {
        /// Product id or slug
        product: String,
        /// Delivery frequency: daily, weekly or monthly
        #[arg(long)]
        freq: String,
        /// Day of week for weekly deliveries (e.g. monday)
        #[arg(long)]
        day: Option<String>,
    },
    /// Cancel a subscription
    Cancel { id: String },
}

#[derive(Subcommand, Debug)]
pub enum WishlistCommand {
    /// List wishlist items
    List,
    /// Add a product to the wishlist
    Add {
        /// Product id or slug
        product: String,
    },
    /// Remove a wishlist item
    Rm { id: String },
}

#[derive(Subcommand, Debug)]
pub enum WebhooksCommand {
    /// List registered webhooks
    List,
    /// Register a webhook URL
    Add {
        url: String,
        /// Comma-separated event names to subscribe to
        #[arg(long, value_delimiter = ',')]
        events: Vec<String>,
    },
    /// Delete a webhook
    Rm { id: String },
}

#[derive(Subcommand, Debug)]
pub enum WatchCommand {
    /// Create a watch rule from query text and inline flags
    ///
    /// Everything after 'create' is the rule definition. The flags --notify,
    /// --interval, --action and --name are picked out wherever they appear;
    /// all remaining words form the query text. Example:
    ///
    ///   tm watch create coffee beans --interval 30 --notify email
    Create {
        /// Query words mixed with rule flags
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List your watch rules
    List,
    /// Pause a rule
    Pause { id: String },
    /// Resume a paused rule
    Resume { id: String },
    /// Delete a rule
    Rm { id: String },
    /// Show a rule's recent trigger log
    Logs { id: String },
}

#[derive(Subcommand, Debug)]
pub enum RequestsCommand {
    /// List open buyer requests
    List,
    /// Post a buyer request
    Create {
        title: String,
        #[arg(long)]
        budget: Option<f64>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show a request with its proposals
    Show { id: String },
    /// Send a proposal on a request
    Propose {
        id: String,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        message: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum LibraryCommand {
    /// List purchased digital items
    List,
    /// Download a purchased item
    Get {
        id: String,
        /// Write to this path instead of the server-suggested filename
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}
