//! Statistics API dialect detection.
//!
//! A coin whose dialect is unknown is tried against every known [`Dialect`],
//! in declaration order, until one parses its API cleanly. The winner is
//! recorded on the coin and never detected again. Attempts run one at a time:
//! each one writes the coin's reading, and the first success ends the loop.

use strum::IntoEnumIterator;

use crate::coin::{ApiType, NetworkSlot};
use crate::dialect::Dialect;
use crate::error::Error;
use crate::http::JsonFetcher;
use crate::tracing::prelude::*;

impl NetworkSlot<'_> {
    /// Return the coin's API type, detecting it first if unresolved.
    ///
    /// Terminal states (`Resolved`, `NotSet`, `Failed`) are returned without
    /// touching the network.
    pub(crate) async fn resolve_api_type(&mut self, fetcher: &dyn JsonFetcher) -> ApiType {
        let current = self.network.api_type();
        if current != ApiType::Unresolved {
            return current;
        }

        if self.api.is_none() {
            self.network.set_api_type(ApiType::NotSet);
            return ApiType::NotSet;
        }

        self.network.set_api_type(ApiType::Detecting);
        for dialect in Dialect::iter() {
            if self.try_dialect(dialect, fetcher).await {
                debug!(coin = %self.symbol, dialect = %dialect, "Detected API dialect");
                let resolved = ApiType::Resolved(dialect);
                self.network.set_api_type(resolved);
                return resolved;
            }
        }

        let e = Error::DialectUnknown(self.symbol.to_string());
        warn!(coin = %self.symbol, "Failed API detection for coin");
        self.network.error = Some(e.to_string());
        self.network.set_api_type(ApiType::Failed);
        ApiType::Failed
    }
}
