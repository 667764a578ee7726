//! `agentrun list` — print discovered skills (spec.md §6).

use ar_skills::SkillList;

pub fn handle_list(skills: &SkillList) {
    let mut names = skills.names();
    names.sort();
    if names.is_empty() {
        println!("no skills found");
        return;
    }
    for name in names {
        let skill = skills.get(&name).expect("name came from skills.names()");
        println!("{name}: {}", skill.description);
    }
}
