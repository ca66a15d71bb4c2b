// SPDX-License-Identifier: Apache-2.0
//! C5: turns raw host output into the boundary [`DiagnosticsResult`],
//! filtering suppressed diagnostics and telemetry per request flags and
//! attributing analyzer-less suppression diagnostics to a sentinel bucket.

use rdc_common::AnalyzerId;

use crate::{
    error::CoordinatorError,
    model::{
        AnalyzerHandle, AnalyzerIdMap, Diagnostic, DiagnosticMap, DiagnosticsRequest,
        DiagnosticsResult, TelemetryInfo,
    },
};

/// The `AnalyzerId` extra suppression diagnostics are attributed to, since
/// the host reports them unattached to any single analyzer (see
/// `DESIGN.md`, Open Question resolution for §9).
pub fn suppressions_bucket_id() -> AnalyzerId {
    AnalyzerId::new("$suppressions")
}

/// Shapes raw per-analyzer output plus loose suppression diagnostics into
/// the boundary result, honoring `request.report_suppressed` and
/// `request.want_telemetry`.
pub fn dehydrate(
    request: &DiagnosticsRequest,
    map: &AnalyzerIdMap,
    raw: Vec<(AnalyzerHandle, DiagnosticMap, TelemetryInfo)>,
    extra_suppression_diagnostics: Vec<Diagnostic>,
) -> Result<DiagnosticsResult, CoordinatorError> {
    let mut per_analyzer = Vec::with_capacity(raw.len());
    let mut telemetry = Vec::with_capacity(raw.len());

    for (analyzer, diagnostics, telemetry_info) in raw {
        let id = map.id_of(&analyzer).cloned().ok_or_else(|| {
            CoordinatorError::ContractViolation(format!(
                "host reported results for unmapped analyzer {:?}",
                analyzer.name()
            ))
        })?;

        let filtered = if request.report_suppressed {
            diagnostics
        } else {
            filter_suppressed(diagnostics)
        };
        per_analyzer.push((id.clone(), filtered));

        if request.want_telemetry {
            telemetry.push((id, telemetry_info));
        }
    }

    if request.report_suppressed && !extra_suppression_diagnostics.is_empty() {
        per_analyzer.push((
            suppressions_bucket_id(),
            DiagnosticMap {
                other: extra_suppression_diagnostics,
                ..Default::default()
            },
        ));
    }

    Ok(DiagnosticsResult {
        per_analyzer,
        telemetry,
    })
}

fn filter_suppressed(map: DiagnosticMap) -> DiagnosticMap {
    let strip = |bucket: Vec<Diagnostic>| {
        bucket
            .into_iter()
            .filter(|d| !d.suppressed)
            .collect::<Vec<_>>()
    };
    let strip_doc =
        |bucket: Vec<(rdc_common::DocumentId, Vec<Diagnostic>)>| -> Vec<(rdc_common::DocumentId, Vec<Diagnostic>)> {
            bucket.into_iter().map(|(doc, ds)| (doc, strip(ds))).collect()
        };
    DiagnosticMap {
        syntax_local: strip_doc(map.syntax_local),
        semantic_local: strip_doc(map.semantic_local),
        nonlocal: strip_doc(map.nonlocal),
        other: strip(map.other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;
    use rdc_common::{ProjectId, SnapshotId};

    fn request(report_suppressed: bool, want_telemetry: bool) -> DiagnosticsRequest {
        DiagnosticsRequest {
            snapshot: SnapshotId::new(1),
            project: ProjectId::new("p"),
            document: None,
            span: None,
            analysis_kind: None,
            analyzer_ids: vec![],
            high_priority: false,
            report_suppressed,
            want_performance: false,
            want_telemetry,
        }
    }

    fn diagnostic(suppressed: bool) -> Diagnostic {
        Diagnostic {
            rule_id: "r".into(),
            message: "m".into(),
            severity: Severity::Warning,
            suppressed,
        }
    }

    #[test]
    fn strips_suppressed_when_not_requested() {
        let mut map = AnalyzerIdMap::default();
        let handle = AnalyzerHandle::new("a");
        map.insert(AnalyzerId::new("a"), handle.clone());

        let diagnostics = DiagnosticMap {
            other: vec![diagnostic(true), diagnostic(false)],
            ..Default::default()
        };
        let result = dehydrate(
            &request(false, false),
            &map,
            vec![(handle, diagnostics, TelemetryInfo::default())],
            vec![],
        )
        .unwrap();

        assert_eq!(result.per_analyzer.len(), 1);
        assert_eq!(result.per_analyzer[0].1.other.len(), 1);
    }

    #[test]
    fn attributes_extra_suppressions_to_sentinel_bucket() {
        let map = AnalyzerIdMap::default();
        let result =
            dehydrate(&request(true, false), &map, vec![], vec![diagnostic(true)]).unwrap();
        assert_eq!(result.per_analyzer.len(), 1);
        assert_eq!(result.per_analyzer[0].0, suppressions_bucket_id());
    }

    #[test]
    fn unmapped_analyzer_is_a_contract_violation() {
        let map = AnalyzerIdMap::default();
        let handle = AnalyzerHandle::new("unmapped");
        let err = dehydrate(
            &request(true, false),
            &map,
            vec![(handle, DiagnosticMap::default(), TelemetryInfo::default())],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, CoordinatorError::ContractViolation(_)));
    }

    #[test]
    fn omits_telemetry_unless_requested() {
        let mut map = AnalyzerIdMap::default();
        let handle = AnalyzerHandle::new("a");
        map.insert(AnalyzerId::new("a"), handle.clone());
        let result = dehydrate(
            &request(true, false),
            &map,
            vec![(handle, DiagnosticMap::default(), TelemetryInfo::default())],
            vec![],
        )
        .unwrap();
        assert!(result.telemetry.is_empty());
    }
}
