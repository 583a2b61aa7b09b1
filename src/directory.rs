use crate::models::Student;

/// Case-insensitive substring match over name and email, preserving
/// collection order. An empty query matches everything.
pub fn filter<'a>(students: &'a [Student], query: &str) -> Vec<&'a Student> {
    let needle = query.to_lowercase();
    students
        .iter()
        .filter(|s| matches(s, &needle))
        .collect()
}

fn matches(student: &Student, needle: &str) -> bool {
    student.name.to_lowercase().contains(needle) || student.email.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster;

    fn names(students: &[&Student]) -> Vec<String> {
        students.iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn empty_query_returns_everything_in_order() {
        let students = roster::seed().unwrap();
        let result = filter(&students, "");
        assert_eq!(
            names(&result),
            vec![
                "Alice Thompson",
                "James Wilson",
                "Sarah Parker",
                "Marcus Chen",
                "Elena Rodriguez",
                "David Kim",
            ]
        );
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let students = roster::seed().unwrap();
        let result = filter(&students, "elena");
        assert_eq!(names(&result), vec!["Elena Rodriguez"]);

        let result = filter(&students, "ELENA");
        assert_eq!(names(&result), vec!["Elena Rodriguez"]);
    }

    #[test]
    fn email_is_searched_too() {
        let students = roster::seed().unwrap();
        let result = filter(&students, "marcus.c@");
        assert_eq!(names(&result), vec!["Marcus Chen"]);

        let result = filter(&students, "school.edu");
        assert_eq!(result.len(), 6);
    }

    #[test]
    fn result_is_exactly_the_matching_subset() {
        let students = roster::seed().unwrap();
        for query in ["a", "son", "K", "@", "zzz", "Chen"] {
            let lowered = query.to_lowercase();
            let expected: Vec<&Student> = students
                .iter()
                .filter(|s| {
                    s.name.to_lowercase().contains(&lowered)
                        || s.email.to_lowercase().contains(&lowered)
                })
                .collect();
            assert_eq!(filter(&students, query), expected, "query {query:?}");
        }
        assert!(filter(&students, "zzz").is_empty());
    }
}
