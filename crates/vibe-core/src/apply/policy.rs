//! Node application policy: LUT or CDL, on which node, with fallback.
//!
//! ```text
//!   Start ──→ TryLut(2) ──✗──→ TryLut(1) ──✗──→ (Required: Failed)
//!     │           │                │              (Preferred: ↓)
//!     │           ✓                ✓
//!     │           └──→ Done ←──────┘
//!     └──(no LUT)──→ TryCdl(2) ──✗──→ TryCdl(1) ──✗──→ Failed
//!                        ✓                ✓
//!                        └──→ Done ←──────┘
//! ```
//!
//! A LUT encodes the whole lift/gamma/gain/contrast/saturation transform,
//! so once it lands CDL is never applied on top of it.

use serde::{Deserialize, Serialize};

use crate::error::{GradeError, Representation};
use crate::grade::cdl::BakedCdl;
use crate::host::{ItemHandle, ResolveHost};
use crate::lut::InstalledLut;

/// Message used when a LUT-only path receives no LUT content.
pub const MISSING_LUT_MESSAGE: &str = "Missing 'lutContent' in payload";

/// What happens when no LUT can be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LutPolicy {
    /// No LUT, or a LUT rejected on every node, fails the request.
    Required,
    /// Use the LUT if there is one and it lands; otherwise fall back to CDL.
    Preferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppliedVia {
    Lut,
    Cdl,
}

/// What was pushed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeApplicationResult {
    pub applied_via: AppliedVia,
    pub node_index: u32,
    /// CDL was deliberately not applied because the LUT already carries the grade.
    pub skipped_cdl: bool,
}

/// Inputs to one policy run.
#[derive(Debug, Clone, Copy)]
pub struct ApplicationRequest<'a> {
    pub item: &'a ItemHandle,
    pub lut: Option<&'a InstalledLut>,
    pub cdl: &'a BakedCdl,
    pub lut_policy: LutPolicy,
}

#[derive(Debug)]
enum Step {
    Start,
    /// Index into the node plan.
    TryLut(usize),
    TryCdl(usize),
    Done(NodeApplicationResult),
    Failed(GradeError),
}

/// Run the policy against `host`. Each attempt is a single host call, so
/// exactly one representation lands on exactly one node, or nothing does.
pub fn apply(
    host: &mut dyn ResolveHost,
    request: &ApplicationRequest<'_>,
) -> Result<NodeApplicationResult, GradeError> {
    let plan = host.api().node_plan();
    let mut step = Step::Start;

    loop {
        step = match step {
            Step::Start => match (request.lut, request.lut_policy) {
                (Some(_), _) => Step::TryLut(0),
                (None, LutPolicy::Required) => {
                    Step::Failed(GradeError::Validation(MISSING_LUT_MESSAGE.into()))
                }
                (None, LutPolicy::Preferred) => enter_cdl(request.cdl),
            },

            Step::TryLut(i) => {
                let Some(lut) = request.lut else {
                    return Err(GradeError::Validation(MISSING_LUT_MESSAGE.into()));
                };
                match plan.get(i) {
                    Some(&node) => {
                        tracing::info!(node, path = %lut.relative_path, "Applying LUT");
                        if host.set_lut(request.item, node, &lut.relative_path)? {
                            tracing::info!(
                                node,
                                "LUT applied. Skipping CDL to prevent double-application of grade."
                            );
                            Step::Done(NodeApplicationResult {
                                applied_via: AppliedVia::Lut,
                                node_index: node,
                                skipped_cdl: true,
                            })
                        } else {
                            tracing::warn!(node, "Could not set LUT on node");
                            Step::TryLut(i + 1)
                        }
                    }
                    None => match request.lut_policy {
                        LutPolicy::Required => Step::Failed(GradeError::HostRejection {
                            representation: Representation::Lut,
                            nodes: plan.to_vec(),
                        }),
                        LutPolicy::Preferred => {
                            tracing::warn!("LUT rejected on every node, falling back to CDL");
                            enter_cdl(request.cdl)
                        }
                    },
                }
            }

            Step::TryCdl(i) => match plan.get(i) {
                Some(&node) => {
                    let params = request.cdl.to_parameter_map(node);
                    tracing::debug!(?params, "Sending CDL map");
                    if host.set_cdl(request.item, &params)? {
                        tracing::info!(node, "CDL applied");
                        Step::Done(NodeApplicationResult {
                            applied_via: AppliedVia::Cdl,
                            node_index: node,
                            skipped_cdl: false,
                        })
                    } else {
                        tracing::warn!(node, "Could not set CDL on node");
                        Step::TryCdl(i + 1)
                    }
                }
                None => Step::Failed(GradeError::HostRejection {
                    representation: Representation::Cdl,
                    nodes: plan.to_vec(),
                }),
            },

            Step::Done(result) => return Ok(result),
            Step::Failed(err) => return Err(err),
        };
    }
}

/// Non-finite CDL never reaches the host.
fn enter_cdl(cdl: &BakedCdl) -> Step {
    if cdl.is_finite() {
        Step::TryCdl(0)
    } else {
        Step::Failed(GradeError::Computation(format!(
            "baked CDL contains non-finite values: {cdl:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GradeErrorKind;
    use crate::grade::cdl::bake;
    use crate::grade::descriptor::{GradeDescriptor, Rgb};
    use crate::host::HostApi;
    use crate::host::memory::MemoryHost;

    fn item() -> ItemHandle {
        ItemHandle("Clip 1".into())
    }

    fn installed() -> InstalledLut {
        InstalledLut {
            installed_path: "/luts/VibeEngine/Temp/Vibe_Live_Preview.cube".into(),
            relative_path: "VibeEngine/Temp/Vibe_Live_Preview.cube".into(),
        }
    }

    fn cdl() -> BakedCdl {
        bake(&GradeDescriptor {
            gain: Rgb::new(0.2, 1.0, 1.0),
            ..GradeDescriptor::default()
        })
    }

    fn run(
        host: &mut MemoryHost,
        lut: Option<&InstalledLut>,
        policy: LutPolicy,
    ) -> Result<NodeApplicationResult, GradeError> {
        let item = item();
        let cdl = cdl();
        apply(
            host,
            &ApplicationRequest {
                item: &item,
                lut,
                cdl: &cdl,
                lut_policy: policy,
            },
        )
    }

    #[test]
    fn test_lut_success_never_applies_cdl() {
        for policy in [LutPolicy::Required, LutPolicy::Preferred] {
            let mut host = MemoryHost::new();
            let lut = installed();
            let result = run(&mut host, Some(&lut), policy).unwrap();
            assert_eq!(
                result,
                NodeApplicationResult {
                    applied_via: AppliedVia::Lut,
                    node_index: 2,
                    skipped_cdl: true,
                }
            );
            assert_eq!(host.log().set_lut_calls().len(), 1);
            assert!(host.log().set_cdl_calls().is_empty());
        }
    }

    #[test]
    fn test_lut_falls_back_to_node_one() {
        let mut host = MemoryHost::new().reject_lut_on(&[2]);
        let lut = installed();
        let result = run(&mut host, Some(&lut), LutPolicy::Required).unwrap();
        assert_eq!(result.applied_via, AppliedVia::Lut);
        assert_eq!(result.node_index, 1);

        let calls = host.log().set_lut_calls();
        assert_eq!(calls.iter().map(|c| (c.0, c.2)).collect::<Vec<_>>(), [(2, false), (1, true)]);
        assert!(host.log().set_cdl_calls().is_empty());
    }

    #[test]
    fn test_required_lut_rejected_everywhere_fails() {
        let mut host = MemoryHost::new().reject_lut_on(&[1, 2]);
        let lut = installed();
        let err = run(&mut host, Some(&lut), LutPolicy::Required).unwrap_err();
        assert_eq!(err.kind(), GradeErrorKind::HostRejection);
        assert_eq!(err.to_string(), "Could not set LUT on Node 1 or 2");
        assert!(host.log().set_cdl_calls().is_empty());
    }

    #[test]
    fn test_required_without_lut_is_validation_error() {
        let mut host = MemoryHost::new();
        let err = run(&mut host, None, LutPolicy::Required).unwrap_err();
        assert_eq!(err.kind(), GradeErrorKind::Validation);
        assert!(host.log().calls().is_empty());
    }

    #[test]
    fn test_preferred_lut_rejected_falls_through_to_cdl() {
        let mut host = MemoryHost::new().reject_lut_on(&[1, 2]);
        let lut = installed();
        let result = run(&mut host, Some(&lut), LutPolicy::Preferred).unwrap();
        assert_eq!(result.applied_via, AppliedVia::Cdl);
        assert_eq!(result.node_index, 2);
        assert!(!result.skipped_cdl);
        assert_eq!(host.log().set_lut_calls().len(), 2);
    }

    #[test]
    fn test_cdl_only_uses_node_index_in_map() {
        let mut host = MemoryHost::new().reject_cdl_on(&[2]);
        let result = run(&mut host, None, LutPolicy::Preferred).unwrap();
        assert_eq!(result.applied_via, AppliedVia::Cdl);
        assert_eq!(result.node_index, 1);

        let calls = host.log().set_cdl_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0.node_index, "2");
        assert_eq!(calls[1].0.node_index, "1");
        assert!(calls[1].0.slope.starts_with("0.200000 "));
        assert!(host.log().set_lut_calls().is_empty());
    }

    #[test]
    fn test_cdl_rejected_everywhere_fails() {
        let mut host = MemoryHost::new().reject_cdl_on(&[1, 2]);
        let err = run(&mut host, None, LutPolicy::Preferred).unwrap_err();
        assert_eq!(err.kind(), GradeErrorKind::HostRejection);
        assert_eq!(err.to_string(), "Could not set CDL on Node 1 or 2");
    }

    #[test]
    fn test_non_finite_cdl_never_reaches_host() {
        let mut host = MemoryHost::new();
        let item = item();
        let cdl = bake(&GradeDescriptor {
            contrast: f64::NAN,
            ..GradeDescriptor::default()
        });
        let err = apply(
            &mut host,
            &ApplicationRequest {
                item: &item,
                lut: None,
                cdl: &cdl,
                lut_policy: LutPolicy::Preferred,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), GradeErrorKind::Computation);
        assert!(host.log().calls().is_empty());
    }

    #[test]
    fn test_single_argument_host_has_one_attempt() {
        let mut host = MemoryHost::new()
            .with_api(HostApi::SingleArgument)
            .reject_lut_on(&[1]);
        let lut = installed();
        let err = run(&mut host, Some(&lut), LutPolicy::Required).unwrap_err();
        assert_eq!(err.to_string(), "Could not set LUT on Node 1");
        assert_eq!(host.log().set_lut_calls().len(), 1);
    }
}
