//! Line-driven search overlay (`shop-search interactive`).
//!
//! Every plain input line is the current contents of the search box and
//! goes through the debouncer, so pasting several lines at once only
//! ranks the last one. Lines starting with `:` are commands:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `:down`, `:j` | move selection down |
//! | `:up`, `:k` | move selection up |
//! | `:enter` | open the selected product and exit |
//! | `:esc` | close the overlay and exit |
//! | `:results` | print the current result list |
//!
//! A command typed while a search is still settling waits for it, so
//! keys always act on the list that was last printed. The featured-item
//! fallback is fetched alongside the catalog; the prompt does not wait
//! for either.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use storefront_search_core::catalog::CatalogSource;
use storefront_search_core::listing::format_price;
use storefront_search_core::navigator::Key;

use crate::api::HttpCatalog;
use crate::config::{Config, SearchConfig};
use crate::search::{mark, LogRouter};
use crate::session::{KeyOutcome, SearchSession, SessionOptions, SessionSnapshot};

pub async fn run_interactive(config: &Config) -> Result<()> {
    let source: Arc<dyn CatalogSource> = Arc::new(HttpCatalog::new(&config.api)?);
    eprintln!("Type to search. Commands: :up :down :enter :esc :results");
    run_overlay(
        source,
        &config.search,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

/// Drive a search session from `input` lines, writing to `out`.
///
/// Returns at end of input, on `:enter` with a selection, or on `:esc`.
pub async fn run_overlay<R, W>(
    source: Arc<dyn CatalogSource>,
    config: &SearchConfig,
    input: R,
    out: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let session = SearchSession::open_with_featured(
        source,
        config.fallback_limit,
        Arc::new(LogRouter),
        SessionOptions::from_config(config),
    );
    let mut overlay = Overlay {
        session,
        out,
        // Slightly past the debounce interval so the evaluation has landed.
        settle: config.debounce() + Duration::from_millis(20),
        dirty: false,
        advisory_shown: false,
    };

    let mut lines = input.lines();
    let mut loaded = false;

    loop {
        tokio::select! {
            biased;

            _ = overlay.session.wait_loaded(), if !loaded => {
                loaded = true;
                let snap = overlay.session.snapshot();
                overlay.announce(&snap).await?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    overlay.settle().await?;
                    break;
                };
                if overlay.handle_line(&line).await? {
                    break;
                }
            }
            _ = tokio::time::sleep(overlay.settle), if overlay.dirty => {
                overlay.settle().await?;
            }
        }
    }

    overlay.session.close();
    Ok(())
}

struct Overlay<W> {
    session: SearchSession,
    out: W,
    settle: Duration,
    /// Input arrived since results were last printed.
    dirty: bool,
    advisory_shown: bool,
}

impl<W: AsyncWrite + Unpin> Overlay<W> {
    /// Returns `true` when the overlay should exit.
    async fn handle_line(&mut self, line: &str) -> Result<bool> {
        let Some(command) = line.strip_prefix(':') else {
            self.session.input(line);
            self.dirty = true;
            return Ok(false);
        };

        self.settle().await?;

        if command.trim() == "results" {
            self.print_results().await?;
            return Ok(false);
        }

        let key = match command.parse::<Key>() {
            Ok(key) => key,
            Err(e) => {
                self.write(&format!("{}\n", e)).await?;
                return Ok(false);
            }
        };

        match self.session.key(key) {
            KeyOutcome::Moved(_) => {
                self.print_results().await?;
                Ok(false)
            }
            KeyOutcome::Confirmed { route, .. } => {
                self.write(&format!("open {}\n", route)).await?;
                Ok(true)
            }
            KeyOutcome::Closed => Ok(true),
            KeyOutcome::Ignored => {
                self.write("(no results)\n").await?;
                Ok(false)
            }
        }
    }

    /// Wait out a pending evaluation, then print its results.
    async fn settle(&mut self) -> Result<()> {
        if self.dirty {
            tokio::time::sleep(self.settle).await;
            self.dirty = false;
            self.print_results().await?;
        }
        Ok(())
    }

    /// Print the degraded-pool advisory, once per session.
    async fn announce(&mut self, snap: &SessionSnapshot) -> Result<()> {
        if self.advisory_shown {
            return Ok(());
        }
        if let Some(ref advisory) = snap.advisory {
            self.advisory_shown = true;
            self.write(&format!("Note: {}\n", advisory)).await?;
        }
        Ok(())
    }

    async fn print_results(&mut self) -> Result<()> {
        let snap = self.session.snapshot();
        self.announce(&snap).await?;
        let text = render_results(&snap);
        self.write(&text).await
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }
}

fn render_results(snap: &SessionSnapshot) -> String {
    if snap.query.trim().is_empty() {
        return String::new();
    }
    if snap.results.is_empty() {
        return format!("No results for \"{}\".\n", snap.query);
    }

    let mut text = format!("{} results\n", snap.results.len());
    for (i, entry) in snap.results.iter().enumerate() {
        let pointer = if i == snap.cursor { '>' } else { ' ' };
        text.push_str(&format!(
            "{} {}  {}\n",
            pointer,
            mark(&entry.name, &snap.query),
            format_price(&entry.price)
        ));
    }
    text
}
