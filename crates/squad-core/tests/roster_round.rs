//! Runs the built-in roster through whole rounds without an orchestrator

use squad_core::{Opinion, Role, Squad, Stance};

async fn run_round(squad: &Squad, scenario: &str) -> Vec<Opinion> {
    let mut prior = Vec::new();
    for member in squad.members() {
        let opinion = member.generate_response(scenario, &[], &prior).await.unwrap();
        prior.push(opinion);
    }
    prior
}

#[tokio::test]
async fn test_calm_scenario_is_supported() {
    let squad = Squad::standard();
    let opinions = run_round(&squad, "Resupply the northern outpost before winter").await;

    let stances: Vec<Stance> = opinions.iter().map(|o| o.stance).collect();
    assert_eq!(
        stances,
        vec![Stance::Support, Stance::Support, Stance::Support, Stance::Support, Stance::Neutral]
    );
}

#[tokio::test]
async fn test_urgent_scenario_draws_challenges() {
    let squad = Squad::standard();
    let opinions = run_round(&squad, "We need to move on the depot immediately").await;

    assert_eq!(opinions[1].role, Role::TacticalPlanner);
    assert_eq!(opinions[1].stance, Stance::Challenge);
    assert_eq!(opinions[2].stance, Stance::Challenge);
    assert_eq!(opinions[3].stance, Stance::Neutral);
    assert!(opinions[3].references_role(Role::TacticalPlanner));
    assert!(opinions[3].references_role(Role::Medic));
}

#[tokio::test]
async fn test_references_only_point_backwards() {
    let squad = Squad::standard();
    for scenario in [
        "Hold the bridge",
        "Storm the compound with force",
        "Negotiate for the hostage release",
    ] {
        let opinions = run_round(&squad, scenario).await;
        for (i, opinion) in opinions.iter().enumerate() {
            for reference in &opinion.references {
                assert!(
                    opinions[..i].iter().any(|o| o.role == reference.role),
                    "{} referenced {} which had not spoken",
                    opinion.role,
                    reference.role
                );
            }
        }
    }
}

#[tokio::test]
async fn test_stances_are_deterministic() {
    let squad = Squad::standard();
    let first = run_round(&squad, "Sacrifice the rear guard to buy time").await;
    let second = run_round(&squad, "Sacrifice the rear guard to buy time").await;
    assert_eq!(first, second);
    assert_eq!(first[2].stance, Stance::Veto);
}

#[tokio::test]
async fn test_harmless_words_do_not_alarm_the_squad() {
    let squad = Squad::standard();
    for scenario in [
        "Restock the pharmacy at the base",
        "Set up a charming welcome for the delegation",
        "Hold until reinforcements arrive",
    ] {
        let opinions = run_round(&squad, scenario).await;
        let stances: Vec<Stance> = opinions.iter().map(|o| o.stance).collect();
        assert!(
            stances.iter().all(|s| !s.is_dissent()),
            "{} drew {:?}",
            scenario,
            stances
        );
    }
}
