//! Cross-reference checks over loaded content.

use std::fmt;

use combat_core::aura::can_trigger_procs;
use combat_core::{
    EffectKind, ProcPayload, SpecialCaseOracle, SpecialTable, SpellId, TemplateCatalog,
};

/// A content problem found by [`validate_content`]. None of these stop the
/// referee; they point at data that will be skipped at runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentIssue {
    /// An effect trigger or a link names a spell with no template.
    UnknownSpell { spell: SpellId, referenced_by: SpellId },
    /// An aura effect without an aura type.
    MissingAuraType { spell: SpellId, effect: usize },
    /// A periodic aura effect that would never tick.
    ZeroAmplitude { spell: SpellId, effect: usize },
    /// A proc declaration on a spell whose auras cannot react to events.
    InertProc { spell: SpellId },
    InvalidMaxStack { spell: SpellId },
    /// A special-case entry for a spell with no template.
    UnknownSpecial { spell: SpellId },
}

impl fmt::Display for ContentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSpell {
                spell,
                referenced_by,
            } => write!(f, "{referenced_by} references unknown {spell}"),
            Self::MissingAuraType { spell, effect } => {
                write!(f, "{spell} effect {effect} applies an aura without a type")
            }
            Self::ZeroAmplitude { spell, effect } => {
                write!(f, "{spell} effect {effect} is periodic with zero amplitude")
            }
            Self::InertProc { spell } => {
                write!(f, "{spell} declares a proc but none of its auras can trigger")
            }
            Self::InvalidMaxStack { spell } => write!(f, "{spell} has a max stack of 0"),
            Self::UnknownSpecial { spell } => write!(f, "special case for unknown {spell}"),
        }
    }
}

/// Checks every template and special-case entry against the catalog.
///
/// Issues come out ordered by spell id.
pub fn validate_content(catalog: &TemplateCatalog, specials: &SpecialTable) -> Vec<ContentIssue> {
    let mut issues = Vec::new();

    for template in catalog.sorted() {
        let spell = template.id;
        if template.max_stack == 0 {
            issues.push(ContentIssue::InvalidMaxStack { spell });
        }
        for (index, effect) in template.effects.iter().enumerate() {
            if effect.kind != EffectKind::ApplyAura {
                continue;
            }
            match effect.aura {
                None => issues.push(ContentIssue::MissingAuraType {
                    spell,
                    effect: index,
                }),
                Some(aura) if aura.is_periodic() && effect.amplitude.is_zero() => {
                    issues.push(ContentIssue::ZeroAmplitude {
                        spell,
                        effect: index,
                    });
                }
                Some(_) => {}
            }
        }
        if template.proc.is_some()
            && !template
                .effects
                .iter()
                .filter_map(|effect| effect.aura)
                .any(can_trigger_procs)
        {
            issues.push(ContentIssue::InertProc { spell });
        }
        for referenced in template.referenced_spells() {
            if !catalog.contains(referenced) {
                issues.push(ContentIssue::UnknownSpell {
                    spell: referenced,
                    referenced_by: spell,
                });
            }
        }
    }

    let mut special_spells: Vec<SpellId> = specials.spells().collect();
    special_spells.sort();
    special_spells.dedup();
    for spell in special_spells {
        if !catalog.contains(spell) {
            issues.push(ContentIssue::UnknownSpecial { spell });
            continue;
        }
        let payload_spell = specials
            .proc_behavior(spell)
            .and_then(|behavior| behavior.payload)
            .and_then(|payload| match payload {
                ProcPayload::CastSpell { spell, .. }
                | ProcPayload::ApplyAura { spell, .. }
                | ProcPayload::RemoveAura { spell, .. } => Some(spell),
                _ => None,
            });
        if let Some(target) = payload_spell
            && !catalog.contains(target)
        {
            issues.push(ContentIssue::UnknownSpell {
                spell: target,
                referenced_by: spell,
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{
        AuraType, EffectTemplate, Millis, ProcBehavior, ProcFlags, ProcTemplate, SpellTemplate,
    };

    #[test]
    fn clean_content_has_no_issues() {
        let catalog: TemplateCatalog = [
            SpellTemplate::new(SpellId(1), "Ignite")
                .with_duration(Millis::from_secs(4))
                .with_effect(
                    EffectTemplate::aura(AuraType::PeriodicDamage, 5).with_amplitude(Millis(2000)),
                ),
            SpellTemplate::new(SpellId(2), "Flame Ward")
                .with_proc(ProcTemplate::new(ProcFlags::TAKEN_MELEE_AUTO, 30))
                .with_effect(EffectTemplate::aura(AuraType::ProcTriggerSpell, 0).with_trigger(SpellId(1))),
        ]
        .into_iter()
        .collect();
        assert!(validate_content(&catalog, &SpecialTable::new()).is_empty());
    }

    #[test]
    fn dangling_references_are_reported() {
        let catalog: TemplateCatalog = [
            SpellTemplate::new(SpellId(1), "Broken")
                .with_max_stack(0)
                .with_effect(EffectTemplate::aura(AuraType::PeriodicHeal, 5))
                .with_effect(EffectTemplate::aura(AuraType::ProcTriggerSpell, 0).with_trigger(SpellId(9))),
        ]
        .into_iter()
        .collect();
        let specials = SpecialTable::new()
            .with_damage_bonus(SpellId(40), 10)
            .with_proc(
                SpellId(1),
                ProcBehavior::default().with_payload(ProcPayload::CastSpell {
                    spell: SpellId(41),
                    on_holder: false,
                }),
            );

        let issues = validate_content(&catalog, &specials);
        assert!(issues.contains(&ContentIssue::InvalidMaxStack { spell: SpellId(1) }));
        assert!(issues.contains(&ContentIssue::ZeroAmplitude {
            spell: SpellId(1),
            effect: 0
        }));
        assert!(issues.contains(&ContentIssue::UnknownSpell {
            spell: SpellId(9),
            referenced_by: SpellId(1)
        }));
        assert!(issues.contains(&ContentIssue::UnknownSpell {
            spell: SpellId(41),
            referenced_by: SpellId(1)
        }));
        assert!(issues.contains(&ContentIssue::UnknownSpecial { spell: SpellId(40) }));
    }
}
