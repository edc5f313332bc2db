//! Pipeline facade: the engine's only public entry point.
//!
//! ```text
//! Idle --load--> Loaded --extract--> Extracted -> Reconciled -> Assembled
//!   \______________\__________________________________________-> Failed
//! ```

use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::core::policy::ALGORITHM_VERSION;
use crate::core::{
    ExtractError, InvoiceMonetaryRecord, LoadError, ProcessingMetadata,
};
use crate::extract::{CustomFields, StandardAmounts, identify};
use crate::reconcile::{detect_gross_as_payable, reconcile, validate_monetary};
use crate::resolve::{
    has_net_total_field, ranked_payable_candidates, resolve_components, resolve_payable,
    resolve_retention,
};
use crate::xml::ParsedDocument;

/// Where the engine is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Loaded,
    Extracted,
    Reconciled,
    Assembled,
    Failed,
}

/// One engine per document. Holds no state shared with other engines, so
/// many can run in parallel.
#[derive(Debug)]
pub struct MonetaryEngine {
    stage: PipelineStage,
    document: Option<ParsedDocument>,
    timestamp: Option<DateTime<Utc>>,
}

impl Default for MonetaryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MonetaryEngine {
    pub fn new() -> Self {
        Self {
            stage: PipelineStage::Idle,
            document: None,
            timestamp: None,
        }
    }

    /// Pin the `processed_at` timestamp instead of reading the clock.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn document(&self) -> Option<&ParsedDocument> {
        self.document.as_ref()
    }

    /// Parse and validate the raw bytes of one document.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        match ParsedDocument::load(bytes) {
            Ok(doc) => {
                debug!(
                    kind = ?doc.kind(),
                    attached = doc.from_attached_document(),
                    "document loaded"
                );
                self.document = Some(doc);
                self.stage = PipelineStage::Loaded;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "document rejected");
                self.document = None;
                self.stage = PipelineStage::Failed;
                Err(e)
            }
        }
    }

    /// Run extraction, resolution and reconciliation over the loaded document.
    ///
    /// May be called again on the same document; the result is the same
    /// except for processing metadata.
    pub fn extract(&mut self) -> Result<InvoiceMonetaryRecord, ExtractError> {
        let started = Instant::now();
        let Some(doc) = self.document.as_ref() else {
            return Err(ExtractError::NotLoaded);
        };

        let identification = identify(doc);
        let custom = CustomFields::extract(doc);
        let standard = StandardAmounts::extract(doc);

        let Some(payable) = resolve_payable(&custom, &standard) else {
            warn!(
                number = identification.number.as_deref().unwrap_or("?"),
                "no payable amount stated anywhere in document"
            );
            self.stage = PipelineStage::Failed;
            return Err(ExtractError::NoAuthoritativeTotal);
        };
        debug!(
            source = ?payable.source,
            field = %payable.field,
            value = %payable.value,
            candidates = ranked_payable_candidates(&custom, &standard).len(),
            "payable resolved"
        );
        let stated_payable = payable.value;
        let components = resolve_components(&custom, &standard, payable);
        let retention = resolve_retention(&custom, &standard, &components);
        self.stage = PipelineStage::Extracted;

        let reconciliation = reconcile(&components, &retention, has_net_total_field(&custom));
        let validation = validate_monetary(&components, &retention);
        let gross_payable_check = detect_gross_as_payable(stated_payable, &components, &retention);
        self.stage = PipelineStage::Reconciled;

        if reconciliation.requires_review {
            warn!(
                number = identification.number.as_deref().unwrap_or("?"),
                status = %reconciliation.status,
                alert = ?reconciliation.alert,
                "monetary record requires review"
            );
        }

        let metadata = ProcessingMetadata {
            algorithm_version: ALGORITHM_VERSION.to_string(),
            elapsed_micros: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            processed_at: self.timestamp.unwrap_or_else(Utc::now),
            from_attached_document: doc.from_attached_document(),
            has_custom_fields: custom.has_custom_fields(),
        };

        let record = InvoiceMonetaryRecord {
            identification,
            corrected_payable: stated_payable - retention.amount,
            stated_payable,
            components,
            retention,
            reconciliation,
            validation,
            gross_payable_check,
            unrecognized_custom_fields: custom.audit(),
            metadata,
        };
        self.stage = PipelineStage::Assembled;

        info!(
            number = record.identification.number.as_deref().unwrap_or("?"),
            stated_payable = %record.stated_payable,
            retention = %record.retention.amount,
            status = %record.reconciliation.status,
            "monetary record assembled"
        );
        Ok(record)
    }
}

/// Load and extract in one call.
pub fn process(bytes: &[u8]) -> Result<InvoiceMonetaryRecord, ExtractError> {
    let mut engine = MonetaryEngine::new();
    engine.load(bytes)?;
    engine.extract()
}
