use super::test_support::Rig;
use super::{ActionOutcome, TickOutcome};
use crate::domain::answers::{Submission, Verdict};
use crate::domain::state::{Phase, TeamId};
use crate::errors::RejectReason;
use crate::repos::store::QuizStore;

struct DomainRig {
    rig: Rig,
    teams: Vec<TeamId>,
    domain: i64,
    questions: Vec<i64>,
    second_domain: i64,
    second_questions: Vec<i64>,
}

/// Two teams and two domains of two open-answer questions each (one whole
/// selection pass), round started with Alpha picking.
async fn two_team_round() -> DomainRig {
    let rig = Rig::new();
    let teams = rig.add_teams(&["Alpha", "Beta"]);
    let (domain, questions) = rig.add_domain_with_questions("history", 2);
    let (second_domain, second_questions) = rig.add_domain_with_questions("geography", 2);
    rig.service.start_domain_round(rig.quiz_id).await.unwrap();
    DomainRig {
        rig,
        teams,
        domain,
        questions,
        second_domain,
        second_questions,
    }
}

#[tokio::test]
async fn full_walk_pass_evaluate_and_finish_the_round() {
    let DomainRig {
        rig,
        teams,
        domain,
        questions,
        second_domain,
        second_questions,
    } = two_team_round().await;
    let (a, b) = (teams[0], teams[1]);

    // Alpha picks the domain and the first question, then passes.
    assert!(rig
        .service
        .select_domain(rig.quiz_id, a, domain)
        .await
        .unwrap()
        .is_applied());
    assert!(rig
        .service
        .select_question(rig.quiz_id, a, questions[0])
        .await
        .unwrap()
        .is_applied());
    assert!(rig
        .service
        .pass_question(rig.quiz_id, a, questions[0])
        .await
        .unwrap()
        .is_applied());

    let quiz = rig.quiz().await;
    assert_eq!(quiz.phase, Phase::Answering);
    assert_eq!(quiz.current_team_id, Some(b));
    assert!(quiz.timer_ends_at.is_some());

    // Beta answers without options and is ruled correct: full ten points.
    rig.service
        .submit_domain_answer(rig.quiz_id, b, questions[0], "1789", true)
        .await
        .unwrap();
    assert_eq!(rig.quiz().await.phase, Phase::AwaitingEvaluation);
    rig.service
        .evaluate_domain_answer(rig.quiz_id, b, questions[0], Verdict::Correct)
        .await
        .unwrap();
    assert_eq!(rig.score(b).await, 10);
    assert_eq!(rig.score(a).await, 0);

    let quiz = rig.quiz().await;
    assert_eq!(quiz.phase, Phase::ShowingResult);
    let summary = quiz.last_domain_answer.expect("summary recorded");
    assert!(summary.question_completed);
    assert_eq!(summary.all_answers.len(), 2);
    assert_eq!(summary.all_answers[0].submission, Submission::Passed);
    assert_eq!(summary.all_answers[1].verdict, Some(Verdict::Correct));
    assert_eq!(summary.all_answers[1].points, 10);

    // Selector rotates to Beta for the second question.
    rig.service.next_domain_question(rig.quiz_id).await.unwrap();
    let quiz = rig.quiz().await;
    assert_eq!(quiz.phase, Phase::SelectingQuestion);
    assert_eq!(quiz.current_team_id, Some(b));

    // Beta takes the options and misses: minus five.
    rig.service
        .select_question(rig.quiz_id, b, questions[1])
        .await
        .unwrap();
    rig.service.show_options(rig.quiz_id, b).await.unwrap();
    assert_eq!(rig.quiz().await.phase, Phase::AnsweringWithOptions);
    rig.service
        .submit_domain_answer(rig.quiz_id, b, questions[1], "wrong", true)
        .await
        .unwrap();
    rig.service
        .evaluate_domain_answer(rig.quiz_id, b, questions[1], Verdict::Incorrect)
        .await
        .unwrap();
    assert_eq!(rig.score(b).await, 5);

    // First domain played; the second selection goes to Beta.
    rig.service.next_domain_question(rig.quiz_id).await.unwrap();
    let quiz = rig.quiz().await;
    assert_eq!(quiz.phase, Phase::SelectingDomain);
    assert_eq!(quiz.current_team_id, Some(b));

    // Beta claims the second domain; both questions pass all the way
    // around, and the round ends.
    rig.service
        .select_domain(rig.quiz_id, b, second_domain)
        .await
        .unwrap();
    for question in &second_questions {
        let quiz = rig.quiz().await;
        let selector = quiz.current_team_id.unwrap();
        let other = if selector == a { b } else { a };
        rig.service
            .select_question(rig.quiz_id, selector, *question)
            .await
            .unwrap();
        rig.service
            .pass_question(rig.quiz_id, selector, *question)
            .await
            .unwrap();
        rig.service
            .pass_question(rig.quiz_id, other, *question)
            .await
            .unwrap();
        rig.service.next_domain_question(rig.quiz_id).await.unwrap();
    }

    let quiz = rig.quiz().await;
    assert_eq!(quiz.phase, Phase::DomainRoundEnded);
    assert_eq!(quiz.current_team_id, None);
    assert_eq!(quiz.selected_domain_id, None);
    assert_eq!(quiz.timer_ends_at, None);
}

#[tokio::test]
async fn turn_and_phase_guards_reject_without_mutating() {
    let DomainRig {
        rig,
        teams,
        domain,
        questions,
        ..
    } = two_team_round().await;
    let (a, b) = (teams[0], teams[1]);

    // Beta tries to pick out of turn.
    assert_eq!(
        rig.service
            .select_domain(rig.quiz_id, b, domain)
            .await
            .unwrap(),
        ActionOutcome::Rejected(RejectReason::NotYourTurn)
    );
    // Picking a question before a domain is claimed.
    assert_eq!(
        rig.service
            .select_question(rig.quiz_id, a, questions[0])
            .await
            .unwrap(),
        ActionOutcome::Rejected(RejectReason::NotInPhase)
    );

    rig.service
        .select_domain(rig.quiz_id, a, domain)
        .await
        .unwrap();
    // Selecting again is a phase violation once the domain is claimed.
    assert_eq!(
        rig.service
            .select_domain(rig.quiz_id, a, domain)
            .await
            .unwrap(),
        ActionOutcome::Rejected(RejectReason::NotInPhase)
    );

    rig.service
        .select_question(rig.quiz_id, a, questions[0])
        .await
        .unwrap();
    // Beta cannot answer Alpha's question.
    assert_eq!(
        rig.service
            .submit_domain_answer(rig.quiz_id, b, questions[0], "sniped", true)
            .await
            .unwrap(),
        ActionOutcome::Rejected(RejectReason::NotYourTurn)
    );
    // Unknown question id.
    assert_eq!(
        rig.service
            .submit_domain_answer(rig.quiz_id, a, 9999, "answer", true)
            .await
            .unwrap(),
        ActionOutcome::Rejected(RejectReason::NotFound)
    );

    // Once the options are shown, passing is forfeit.
    rig.service.show_options(rig.quiz_id, a).await.unwrap();
    assert_eq!(
        rig.service
            .pass_question(rig.quiz_id, a, questions[0])
            .await
            .unwrap(),
        ActionOutcome::Rejected(RejectReason::NotInPhase)
    );
    // Options cannot be shown twice.
    assert_eq!(
        rig.service.show_options(rig.quiz_id, a).await.unwrap(),
        ActionOutcome::Rejected(RejectReason::NotInPhase)
    );
}

#[tokio::test]
async fn a_used_domain_cannot_be_picked_again() {
    let rig = Rig::new();
    let teams = rig.add_teams(&["Alpha", "Beta"]);
    let (history, history_questions) = rig.add_domain_with_questions("history", 2);
    let (science, _) = rig.add_domain_with_questions("science", 2);
    rig.service.start_domain_round(rig.quiz_id).await.unwrap();
    let (a, b) = (teams[0], teams[1]);

    rig.service
        .select_domain(rig.quiz_id, a, history)
        .await
        .unwrap();
    // Play the domain out: both questions pass all the way around.
    for question in &history_questions {
        let quiz = rig.quiz().await;
        let selector = quiz.current_team_id.unwrap();
        let other = if selector == a { b } else { a };
        rig.service
            .select_question(rig.quiz_id, selector, *question)
            .await
            .unwrap();
        rig.service
            .pass_question(rig.quiz_id, selector, *question)
            .await
            .unwrap();
        rig.service
            .pass_question(rig.quiz_id, other, *question)
            .await
            .unwrap();
        rig.service.next_domain_question(rig.quiz_id).await.unwrap();
    }

    // Back at domain selection with Beta picking; history is spent.
    let quiz = rig.quiz().await;
    assert_eq!(quiz.phase, Phase::SelectingDomain);
    assert_eq!(quiz.current_team_id, Some(b));
    assert_eq!(
        rig.service
            .select_domain(rig.quiz_id, b, history)
            .await
            .unwrap(),
        ActionOutcome::Rejected(RejectReason::AlreadyAnswered)
    );
    assert!(rig
        .service
        .select_domain(rig.quiz_id, b, science)
        .await
        .unwrap()
        .is_applied());
}

#[tokio::test]
async fn full_pass_around_closes_the_question_unscored() {
    let DomainRig {
        rig,
        teams,
        domain,
        questions,
        ..
    } = two_team_round().await;
    let (a, b) = (teams[0], teams[1]);

    rig.service
        .select_domain(rig.quiz_id, a, domain)
        .await
        .unwrap();
    rig.service
        .select_question(rig.quiz_id, a, questions[0])
        .await
        .unwrap();
    rig.service
        .pass_question(rig.quiz_id, a, questions[0])
        .await
        .unwrap();
    rig.service
        .pass_question(rig.quiz_id, b, questions[0])
        .await
        .unwrap();

    let quiz = rig.quiz().await;
    assert_eq!(quiz.phase, Phase::ShowingResult);
    assert_eq!(quiz.questions_in_domain, 1);
    assert_eq!(quiz.timer_ends_at, None);
    let summary = quiz.last_domain_answer.expect("summary recorded");
    assert!(summary.question_completed);
    assert_eq!(summary.all_answers.len(), 2);
    assert!(summary
        .all_answers
        .iter()
        .all(|entry| entry.submission == Submission::Passed));

    let question = rig
        .store
        .find_question(questions[0])
        .await
        .unwrap()
        .unwrap();
    assert!(question.is_answered);
    assert_eq!(question.passed_from, Some(a));
    assert_eq!(rig.score(a).await, 0);
    assert_eq!(rig.score(b).await, 0);
}

#[tokio::test]
async fn wrong_answer_without_options_passes_onward() {
    let DomainRig {
        rig,
        teams,
        domain,
        questions,
        ..
    } = two_team_round().await;
    let (a, b) = (teams[0], teams[1]);

    rig.service
        .select_domain(rig.quiz_id, a, domain)
        .await
        .unwrap();
    rig.service
        .select_question(rig.quiz_id, a, questions[0])
        .await
        .unwrap();
    rig.service
        .submit_domain_answer(rig.quiz_id, a, questions[0], "1492", true)
        .await
        .unwrap();
    rig.service
        .evaluate_domain_answer(rig.quiz_id, a, questions[0], Verdict::Incorrect)
        .await
        .unwrap();

    // No penalty without options; Beta inherits the question on the clock.
    assert_eq!(rig.score(a).await, 0);
    let quiz = rig.quiz().await;
    assert_eq!(quiz.phase, Phase::Answering);
    assert_eq!(quiz.current_team_id, Some(b));
    assert!(quiz.timer_ends_at.is_some());

    // Beta answers and is ruled correct.
    rig.service
        .submit_domain_answer(rig.quiz_id, b, questions[0], "1789", false)
        .await
        .unwrap();
    rig.service
        .evaluate_domain_answer(rig.quiz_id, b, questions[0], Verdict::Correct)
        .await
        .unwrap();
    assert_eq!(rig.score(b).await, 10);
    assert_eq!(rig.quiz().await.phase, Phase::ShowingResult);
}

#[tokio::test]
async fn lapsed_window_on_a_passable_question_acts_as_a_pass() {
    let DomainRig {
        rig,
        teams,
        domain,
        questions,
        ..
    } = two_team_round().await;
    let (a, b) = (teams[0], teams[1]);

    rig.service
        .select_domain(rig.quiz_id, a, domain)
        .await
        .unwrap();
    rig.service
        .select_question(rig.quiz_id, a, questions[0])
        .await
        .unwrap();

    rig.tick(60);
    assert_eq!(
        rig.service.check_domain_timers(rig.quiz_id).await.unwrap(),
        TickOutcome::Fired
    );
    // The same tick again finds the consequence already applied.
    assert_eq!(
        rig.service.check_domain_timers(rig.quiz_id).await.unwrap(),
        TickOutcome::Idle
    );

    let quiz = rig.quiz().await;
    assert_eq!(quiz.phase, Phase::Answering);
    assert_eq!(quiz.current_team_id, Some(b));
    let summary = quiz.last_domain_answer.expect("summary recorded");
    assert_eq!(summary.answer, Submission::TimedOut);
}

#[tokio::test]
async fn lapsed_window_with_options_shown_freezes_a_timeout() {
    let DomainRig {
        rig,
        teams,
        domain,
        questions,
        ..
    } = two_team_round().await;
    let a = teams[0];

    rig.service
        .select_domain(rig.quiz_id, a, domain)
        .await
        .unwrap();
    rig.service
        .select_question(rig.quiz_id, a, questions[0])
        .await
        .unwrap();
    rig.service.show_options(rig.quiz_id, a).await.unwrap();

    rig.tick(60);
    assert_eq!(
        rig.service.check_domain_timers(rig.quiz_id).await.unwrap(),
        TickOutcome::Fired
    );

    let quiz = rig.quiz().await;
    assert_eq!(quiz.phase, Phase::AwaitingEvaluation);
    assert_eq!(quiz.timer_ends_at, None);
    let summary = quiz.last_domain_answer.expect("summary recorded");
    assert_eq!(summary.answer, Submission::TimedOut);
    assert!(summary.with_options);

    // The host still rules on it; wrong with options costs five.
    rig.service
        .evaluate_domain_answer(rig.quiz_id, a, questions[0], Verdict::Incorrect)
        .await
        .unwrap();
    assert_eq!(rig.score(a).await, -5);
    assert_eq!(rig.quiz().await.phase, Phase::ShowingResult);
}

#[tokio::test]
async fn the_round_ends_after_a_whole_number_of_selection_passes() {
    // Varied roster/domain shapes; each domain carries exactly one
    // question per team so the per-domain quota is a single pass.
    for (domain_count, team_count) in [(2usize, 2usize), (3, 2), (5, 2), (3, 3), (7, 3), (4, 3)] {
        let rig = Rig::new();
        let names: Vec<String> = (0..team_count).map(|i| format!("team {i}")).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        rig.add_teams(&name_refs);
        let mut domains = Vec::new();
        for i in 0..domain_count {
            let (domain, _) = rig.add_domain_with_questions(&format!("domain {i}"), team_count);
            domains.push(domain);
        }
        rig.service.start_domain_round(rig.quiz_id).await.unwrap();

        let expected = (domain_count / team_count) * team_count;
        let mut selections = 0usize;
        loop {
            let quiz = rig.quiz().await;
            match quiz.phase {
                Phase::SelectingDomain => {
                    let picker = quiz.current_team_id.expect("picker on the clock");
                    let domain = domains
                        .iter()
                        .copied()
                        .find(|d| !quiz.used_domains.contains(d))
                        .expect("an unused domain remains");
                    rig.service
                        .select_domain(rig.quiz_id, picker, domain)
                        .await
                        .unwrap();
                    selections += 1;
                }
                Phase::SelectingQuestion => {
                    let picker = quiz.current_team_id.expect("selector on the clock");
                    let domain = quiz.selected_domain_id.expect("domain claimed");
                    let question = rig
                        .store
                        .domain_questions(domain)
                        .await
                        .unwrap()
                        .into_iter()
                        .find(|q| !q.is_answered)
                        .expect("an open question remains")
                        .id;
                    rig.service
                        .select_question(rig.quiz_id, picker, question)
                        .await
                        .unwrap();
                    rig.service
                        .submit_domain_answer(rig.quiz_id, picker, question, "answer", true)
                        .await
                        .unwrap();
                    rig.service
                        .evaluate_domain_answer(rig.quiz_id, picker, question, Verdict::Correct)
                        .await
                        .unwrap();
                    rig.service.next_domain_question(rig.quiz_id).await.unwrap();
                }
                Phase::DomainRoundEnded => break,
                other => panic!("round stuck in {other:?}"),
            }
        }
        assert_eq!(
            selections, expected,
            "{domain_count} domains across {team_count} teams"
        );
    }
}

#[tokio::test]
async fn duplicate_evaluation_is_rejected() {
    let DomainRig {
        rig,
        teams,
        domain,
        questions,
        ..
    } = two_team_round().await;
    let a = teams[0];

    rig.service
        .select_domain(rig.quiz_id, a, domain)
        .await
        .unwrap();
    rig.service
        .select_question(rig.quiz_id, a, questions[0])
        .await
        .unwrap();
    rig.service
        .submit_domain_answer(rig.quiz_id, a, questions[0], "1789", true)
        .await
        .unwrap();
    rig.service
        .evaluate_domain_answer(rig.quiz_id, a, questions[0], Verdict::Correct)
        .await
        .unwrap();
    assert_eq!(rig.score(a).await, 10);

    // A second verdict finds the phase moved on; the score stands.
    assert_eq!(
        rig.service
            .evaluate_domain_answer(rig.quiz_id, a, questions[0], Verdict::Correct)
            .await
            .unwrap(),
        ActionOutcome::Rejected(RejectReason::NotInPhase)
    );
    assert_eq!(rig.score(a).await, 10);
}
