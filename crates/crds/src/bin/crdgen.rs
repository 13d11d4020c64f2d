//! Prints the `KluctlDeployment` CRD as YAML.
//!
//! Useful for local clusters where the kluctl controller is not installed yet.

use crds::KluctlDeployment;
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&KluctlDeployment::crd())?);
    Ok(())
}
