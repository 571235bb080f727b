use std::sync::Arc;

use super::resolver::OBJECT;
use super::{ResolvedMethod, ResolvedType, Scope, SymbolResolver, TypeHandle};
use crate::core::syntax::{Annotation, CompilationUnit, Expr, MethodCall, TypeRef};

impl<'a> SymbolResolver<'a> {
    pub fn qualified_name_of(&self, ty: &TypeRef, scope: &Scope<'_>) -> String {
        let resolved = self.resolve_type_ref(ty, scope);
        resolved
            .erasure()
            .map(str::to_string)
            .unwrap_or_else(|| resolved.describe())
    }

    pub fn qualified_name_of_declaring_type<'m>(&self, method: &'m ResolvedMethod) -> &'m str {
        &method.declaring_type
    }

    pub fn signature_of(&self, method: &ResolvedMethod) -> String {
        method.signature()
    }

    pub fn qualified_signature_of(&self, method: &ResolvedMethod) -> String {
        method.qualified_signature()
    }

    /// Static type of an expression; `null` has no usable type
    pub fn try_resolve_type(&self, expr: &Expr, scope: &Scope<'_>) -> Option<ResolvedType> {
        self.type_of(expr, scope).filter(|ty| *ty != ResolvedType::Null)
    }

    /// Candidate qualified names of an annotation type
    ///
    /// Annotation types usually live outside the analyzed sources, so a simple
    /// name only imported on demand yields one candidate per wildcard import.
    pub fn annotation_names(&self, annotation: &Annotation, scope: &Scope<'_>) -> Vec<String> {
        self.candidate_names(&annotation.name, scope)
    }

    /// Resolved name of a type written in `scope`, else one guess per wildcard import
    pub fn candidate_names(&self, name: &str, scope: &Scope<'_>) -> Vec<String> {
        if let Some(resolved) = self.resolve_type_name(name, scope) {
            return vec![resolved];
        }
        scope
            .owner
            .unit
            .imports
            .iter()
            .filter(|import| import.wildcard && !import.is_static)
            .map(|import| format!("{}.{}", import.path, name))
            .collect()
    }

    /// Qualified signatures of the same method in each directly implemented interface
    pub fn interface_definitions_of(&self, class: &TypeHandle, signature: &str) -> Vec<String> {
        if class.decl.is_interface() {
            return Vec::new();
        }
        let (_, interfaces) = self.direct_supertypes(class);
        interfaces
            .iter()
            .filter_map(|name| self.lookup(name))
            .filter_map(|interface| self.find_declared_method(interface, signature))
            .map(|method| method.qualified_signature())
            .collect()
    }

    pub fn find_declared_method(&self, handle: &TypeHandle, signature: &str) -> Option<ResolvedMethod> {
        handle
            .methods()
            .filter(|method| !method.decl.is_constructor())
            .map(|method| self.resolve_declaration(&method))
            .find(|method| method.signature() == signature)
    }

    /// Nearest declaration of `signature` in the type's hierarchy
    pub fn find_in_hierarchy(&self, qualified_name: &str, signature: &str) -> Option<ResolvedMethod> {
        self.hierarchy(qualified_name)
            .into_iter()
            .find_map(|handle| self.find_declared_method(handle, signature))
    }

    /// Nearest override of `signature` walking the superclass chain from
    /// `subtype` up to, but excluding, `declaring_type`
    pub fn find_override(&self, subtype: &str, declaring_type: &str, signature: &str) -> Option<ResolvedMethod> {
        let mut current = Some(subtype.to_string());
        while let Some(name) = current.take() {
            if name == declaring_type || name == OBJECT {
                return None;
            }
            let handle = self.lookup(&name)?;
            if let Some(method) = self.find_declared_method(handle, signature) {
                return Some(method);
            }
            current = self.direct_supertypes(handle).0;
        }
        None
    }

    /// Project classes whose superclass is `qualified_name`, in registration order
    pub fn direct_subclasses(&self, qualified_name: &str) -> Vec<&'a TypeHandle> {
        self.types()
            .project_types()
            .filter(|handle| !handle.decl.is_interface())
            .filter(|handle| self.direct_supertypes(handle).0.as_deref() == Some(qualified_name))
            .collect()
    }

    /// Every type declared in a compilation unit, as table handles
    pub fn types_in(&self, unit: &Arc<CompilationUnit>) -> Vec<&'a TypeHandle> {
        unit.all_types()
            .iter()
            .filter_map(|(_, decl)| self.lookup(&decl.qualified_name))
            .collect()
    }

    /// Qualified signatures of every method called `name` declared in the unit
    pub fn overload_signatures(&self, unit: &Arc<CompilationUnit>, name: &str) -> Vec<String> {
        self.types_in(unit)
            .into_iter()
            .flat_map(|handle| handle.methods())
            .filter(|method| !method.decl.is_constructor() && method.decl.name == name)
            .map(|method| self.resolve_declaration(&method).qualified_signature())
            .collect()
    }

    /// Methods in the unit matching a call by name and argument count only
    pub fn structural_candidates(&self, unit: &Arc<CompilationUnit>, call: &MethodCall) -> Vec<ResolvedMethod> {
        self.types_in(unit)
            .into_iter()
            .flat_map(|handle| handle.methods())
            .filter(|method| {
                !method.decl.is_constructor()
                    && method.decl.name == call.name
                    && method.decl.params.len() == call.args.len()
            })
            .map(|method| self.resolve_declaration(&method))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::languages::JavaParser;
    use crate::core::options::LanguageLevel;
    use crate::core::symbols::{Origin, TypeTable, PLATFORM_SOURCES};
    use crate::core::syntax::{AnnotationArgs, Literal};
    use std::path::Path;

    fn table(sources: &[(&str, &str)]) -> TypeTable {
        let mut parser = JavaParser::new().unwrap();
        let mut table = TypeTable::new();
        for (path, source) in sources {
            let unit = Arc::new(parser.parse(source, Path::new(path)).unwrap());
            table.register_unit(&unit, Origin::Project);
        }
        for (path, source) in PLATFORM_SOURCES {
            let unit = Arc::new(parser.parse(source, Path::new(path)).unwrap());
            table.register_unit(&unit, Origin::Platform);
        }
        table
    }

    const SOURCES: &[(&str, &str)] = &[
        (
            "pkg/Plant.java",
            "package pkg; public abstract class Plant { public void freezeAndThaw() { wither(); } protected abstract void wither(); }",
        ),
        ("pkg/Melothria.java", "package pkg; public class Melothria extends Plant { protected void wither() {} }"),
        ("pkg/Cucumber.java", "package pkg; public class Cucumber extends Melothria { }"),
        ("pkg/Pickle.java", "package pkg; public class Pickle extends Cucumber { protected void wither() {} }"),
        ("pkg/Person.java", "package pkg; public interface Person { void waterPlants(); }"),
        (
            "pkg/MockedGardener.java",
            r#"
package pkg;
import java.util.List;
public class MockedGardener implements Person {
    public void waterPlants() {}
    public void water(Plant plant) {}
    public void water(List<Plant> plants) {}
    public void rest() {}
}
"#,
        ),
    ];

    #[test]
    fn interface_definitions_come_from_direct_interfaces() {
        let table = table(SOURCES);
        let resolver = SymbolResolver::new(&table, LanguageLevel::Java11);
        let gardener = table.get("pkg.MockedGardener").unwrap();

        assert_eq!(
            resolver.interface_definitions_of(gardener, "waterPlants()"),
            vec!["pkg.Person.waterPlants()"]
        );
        assert!(resolver.interface_definitions_of(gardener, "rest()").is_empty());
    }

    #[test]
    fn finds_overrides_and_direct_subclasses() {
        let table = table(SOURCES);
        let resolver = SymbolResolver::new(&table, LanguageLevel::Java11);

        let subclasses: Vec<&str> = resolver.direct_subclasses("pkg.Plant").iter().map(|h| h.qualified_name()).collect();
        assert_eq!(subclasses, vec!["pkg.Melothria"]);

        let nearest = resolver.find_override("pkg.Cucumber", "pkg.Plant", "wither()").unwrap();
        assert_eq!(nearest.qualified_signature(), "pkg.Melothria.wither()");
        assert!(resolver.find_override("pkg.Plant", "pkg.Plant", "wither()").is_none());

        let inherited = resolver.find_in_hierarchy("pkg.Cucumber", "freezeAndThaw()").unwrap();
        assert_eq!(inherited.declaring_type, "pkg.Plant");
    }

    #[test]
    fn overload_signatures_cover_the_whole_unit() {
        let table = table(SOURCES);
        let resolver = SymbolResolver::new(&table, LanguageLevel::Java11);
        let unit = table.get("pkg.MockedGardener").unwrap().unit.clone();

        assert_eq!(
            resolver.overload_signatures(&unit, "water"),
            vec![
                "pkg.MockedGardener.water(pkg.Plant)",
                "pkg.MockedGardener.water(java.util.List<pkg.Plant>)",
            ]
        );
    }

    #[test]
    fn annotation_names_fall_back_to_wildcard_imports() {
        let table = table(&[(
            "pkg/Steps.java",
            r#"
package pkg;
import cucumber.api.java.en.*;
import io.cucumber.java.nl.Als;
class Steps {}
"#,
        )]);
        let resolver = SymbolResolver::new(&table, LanguageLevel::Java11);
        let steps = table.get("pkg.Steps").unwrap();
        let scope = Scope::of_type(steps);

        let when = Annotation { name: "When".to_string(), args: AnnotationArgs::Marker };
        assert_eq!(resolver.annotation_names(&when, &scope), vec!["cucumber.api.java.en.When"]);

        let als = Annotation { name: "Als".to_string(), args: AnnotationArgs::Marker };
        assert_eq!(resolver.annotation_names(&als, &scope), vec!["io.cucumber.java.nl.Als"]);

        let qualified = Annotation { name: "io.cucumber.java.en.Given".to_string(), args: AnnotationArgs::Marker };
        assert_eq!(resolver.annotation_names(&qualified, &scope), vec!["io.cucumber.java.en.Given"]);
    }

    #[test]
    fn null_has_no_resolved_type() {
        let table = table(SOURCES);
        let resolver = SymbolResolver::new(&table, LanguageLevel::Java11);
        let scope = Scope::of_type(table.get("pkg.Plant").unwrap());

        let created = Expr::New { ty: TypeRef::named("Melothria"), args: Vec::new() };
        assert_eq!(resolver.try_resolve_type(&created, &scope).unwrap().describe(), "pkg.Melothria");
        assert!(resolver.try_resolve_type(&Expr::Literal(Literal::Null), &scope).is_none());
    }

    #[test]
    fn qualified_names_of_written_types() {
        let table = table(SOURCES);
        let resolver = SymbolResolver::new(&table, LanguageLevel::Java11);
        let plant = table.get("pkg.Plant").unwrap();
        let scope = Scope::of_type(plant);

        assert_eq!(resolver.qualified_name_of(&TypeRef::named("Melothria"), &scope), "pkg.Melothria");
        assert_eq!(resolver.qualified_name_of(&TypeRef::named("String"), &scope), "java.lang.String");
        let array = TypeRef { name: "Plant".to_string(), args: Vec::new(), array_dims: 1 };
        assert_eq!(resolver.qualified_name_of(&array, &scope), "pkg.Plant[]");
    }
}
