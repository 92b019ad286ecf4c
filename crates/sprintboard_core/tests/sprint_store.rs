use chrono::{Duration, TimeZone, Utc};
use sprintboard_core::{
    Complexity, NewComment, NewResource, NewSprint, SprintChange, SprintService,
    SprintServiceError, SprintStatus, SprintTask, SprintTaskStatus, TaskPrediction,
};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

fn sprint_task(id: u64, prediction: u8) -> SprintTask {
    SprintTask {
        id,
        title: format!("story {id}"),
        story_points: 3,
        assignee: "Saran".to_string(),
        status: SprintTaskStatus::Todo,
        dependencies: BTreeSet::new(),
        complexity: Complexity::Medium,
        prediction,
    }
}

fn new_sprint(name: &str, status: SprintStatus, tasks: Vec<SprintTask>) -> NewSprint {
    let start = Utc.with_ymd_and_hms(2025, 4, 7, 9, 0, 0).unwrap();
    NewSprint {
        name: name.to_string(),
        start_date: start,
        end_date: start + Duration::days(14),
        story_points: 40,
        completed_points: 0,
        status,
        tasks,
    }
}

fn comment(task_id: i64, content: &str) -> NewComment {
    NewComment {
        task_id,
        user_id: "joe".to_string(),
        content: content.to_string(),
        timestamp: Utc.with_ymd_and_hms(2025, 4, 7, 10, 0, 0).unwrap(),
        attachments: Vec::new(),
    }
}

#[test]
fn sprint_ids_are_sequential_and_active_is_first_match() {
    let mut service = SprintService::new();
    assert!(service.active_sprint().is_none());

    let planned = service
        .add_sprint(new_sprint("Planning", SprintStatus::Planned, Vec::new()))
        .unwrap();
    let first_active = service
        .add_sprint(new_sprint("Alpha", SprintStatus::Active, Vec::new()))
        .unwrap();
    let second_active = service
        .add_sprint(new_sprint("Beta", SprintStatus::Active, Vec::new()))
        .unwrap();

    assert_eq!(
        (planned.id, first_active.id, second_active.id),
        (1, 2, 3)
    );
    assert_eq!(service.active_sprint().unwrap().id, first_active.id);
    assert_eq!(service.list_sprints().len(), 3);
}

#[test]
fn update_status_changes_sprint_and_unknown_id_fails() {
    let mut service = SprintService::with_seed_data(Utc::now());

    let done = service
        .update_sprint_status(1, SprintStatus::Completed)
        .unwrap();
    assert_eq!(done.status, SprintStatus::Completed);
    assert!(service.active_sprint().is_none());

    let err = service
        .update_sprint_status(99, SprintStatus::Active)
        .unwrap_err();
    assert_eq!(err, SprintServiceError::SprintNotFound(99));
}

#[test]
fn prediction_above_hundred_is_rejected() {
    let mut service = SprintService::new();
    let err = service
        .add_sprint(new_sprint(
            "Gamma",
            SprintStatus::Planned,
            vec![sprint_task(1, 90), sprint_task(2, 101)],
        ))
        .unwrap_err();

    assert_eq!(
        err,
        SprintServiceError::InvalidPrediction {
            task_id: 2,
            value: 101
        }
    );
    assert!(service.list_sprints().is_empty());
}

#[test]
fn assignment_upsert_keeps_one_entry_and_recomputes_hours() {
    let mut service = SprintService::new();
    let resource = service.add_resource(NewResource {
        name: "Platform".to_string(),
        role: "Development".to_string(),
        available_hours: 40.0,
        assignments: Vec::new(),
    });
    assert_eq!(resource.id, 1);

    service.update_resource_assignment(1, 2, 6.0).unwrap();
    service.update_resource_assignment(1, 5, 10.0).unwrap();
    let updated = service.update_resource_assignment(1, 5, 15.0).unwrap();

    let for_task_five: Vec<_> = updated
        .assignments
        .iter()
        .filter(|assignment| assignment.task_id == 5)
        .collect();
    assert_eq!(for_task_five.len(), 1);
    assert_eq!(for_task_five[0].hours, 15.0);

    let expected: f64 = updated.assignments.iter().map(|a| a.hours).sum();
    assert_eq!(updated.utilized_hours, expected);
    assert_eq!(updated.utilized_hours, 21.0);
    assert_eq!(service.list_resources()[0], updated);
}

#[test]
fn assignment_on_unknown_resource_fails_without_notifying() {
    let mut service = SprintService::new();
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    service.subscribe(move |_| *counter.borrow_mut() += 1);

    let err = service.update_resource_assignment(7, 1, 3.0).unwrap_err();

    assert_eq!(err, SprintServiceError::ResourceNotFound(7));
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn comment_mentions_are_extracted_in_order() {
    let mut service = SprintService::new();
    let added = service.add_comment(comment(5, "great job @alice @bob"));

    assert_eq!(added.id, 1);
    assert_eq!(added.mentions, vec!["alice".to_string(), "bob".to_string()]);
}

#[test]
fn comments_for_task_filter_by_task_in_insertion_order() {
    let mut service = SprintService::new();
    let first = service.add_comment(comment(5, "first"));
    service.add_comment(comment(6, "elsewhere"));
    let third = service.add_comment(comment(5, "third"));

    assert_eq!(service.comments_for_task(5), vec![first, third]);
    assert!(service.comments_for_task(9).is_empty());
}

#[test]
fn predictions_flatten_sprints_in_order() {
    let mut service = SprintService::with_seed_data(Utc::now());
    service
        .add_sprint(new_sprint(
            "Next",
            SprintStatus::Planned,
            vec![sprint_task(10, 40), sprint_task(11, 70)],
        ))
        .unwrap();

    assert_eq!(
        service.task_predictions(),
        vec![
            TaskPrediction {
                task_id: 1,
                prediction: 85
            },
            TaskPrediction {
                task_id: 10,
                prediction: 40
            },
            TaskPrediction {
                task_id: 11,
                prediction: 70
            },
        ]
    );
}

#[test]
fn subscribers_receive_store_changes() {
    let mut service = SprintService::with_seed_data(Utc::now());
    let events: Rc<RefCell<Vec<SprintChange>>> = Rc::default();
    let sink = Rc::clone(&events);
    let id = service.subscribe(move |change| sink.borrow_mut().push(*change));

    service.update_sprint_status(1, SprintStatus::Completed).unwrap();
    service.update_resource_assignment(1, 1, 30.0).unwrap();
    let added = service.add_comment(comment(3, "done"));
    service.unsubscribe(id);
    service.add_comment(comment(3, "unseen"));

    assert_eq!(
        *events.borrow(),
        vec![
            SprintChange::SprintStatusChanged(1, SprintStatus::Completed),
            SprintChange::AssignmentUpdated {
                resource_id: 1,
                task_id: 1
            },
            SprintChange::CommentAdded {
                comment_id: added.id,
                task_id: 3
            },
        ]
    );
}
