use crate::strategy::StrategySelection;
use crate::submit::BUNDLE_GEMFILE_ENV;
use xtc_runtime::{gem_install, ruby_command, InvocationPlan, RubyInstallType};

/// Commands that put cucumber and the test-cloud client in place, in the
/// order they must run.
///
/// A single `bundle install` covers every managed gem; each gem on the
/// latest strategy gets its own global `gem install`.
pub fn plan_installation(
    selection: &StrategySelection,
    ruby: RubyInstallType,
) -> Vec<InvocationPlan> {
    let mut plans = Vec::new();

    if let Some(gemfile) = selection.bundler_gemfile() {
        plans.push(
            ruby_command(ruby, &["bundle", "install", "--jobs", "20", "--retry", "5"])
                .with_env(BUNDLE_GEMFILE_ENV, &gemfile.to_string_lossy()),
        );
    }

    for (gem, strategy) in selection.per_gem() {
        if !strategy.is_managed() {
            plans.extend(gem_install(ruby, gem, None));
        }
    }

    plans
}
